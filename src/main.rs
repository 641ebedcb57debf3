//! # photo-guard CLI
//!
//! Command-line front end for the vehicle photo upload guard.
//!
//! ## Usage
//! ```bash
//! photo-guard check front.jpg rear.jpg --owner dealer-7 --commit
//! photo-guard scan ~/uploads --owner dealer-7 --output json
//! ```

mod cli;

use vehicle_photo_guard::Result;

fn main() -> Result<()> {
    cli::run()
}
