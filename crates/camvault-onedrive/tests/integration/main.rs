//! Integration tests for camvault-onedrive
//!
//! Uses wiremock to stand in for both the Live token endpoints and the
//! OneDrive item-by-path API.

mod common;

mod test_auth;
mod test_pictures;
