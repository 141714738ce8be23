//! Integration tests driving the full router.

mod helpers;

mod auth_test;
mod guard_test;
mod ws_test;
