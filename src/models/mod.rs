// Wire payloads for the Mazovia backend

pub mod auth;
pub mod verification;
