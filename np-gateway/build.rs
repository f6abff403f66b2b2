//! Build script for np-gateway
//!
//! Captures the git commit, build timestamp and build profile.

#[path = "../build-support/build_info.rs"]
mod build_info;

fn main() {
    build_info::emit();
}
