//! Error handling utilities

use tracing::error;

/// Report a fatal error and exit with its status code
///
/// `ApidError`s print their user message, plus the developer message with
/// the full cause chain when `verbose >= 1`. Anything else exits with 1.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    use crate::error::ApidError;

    error!("Fatal error: {}", error);

    let exit_code = if let Some(apid_err) = error.downcast_ref::<ApidError>() {
        eprintln!("{}", apid_err.user_message());

        if verbose >= 1 {
            eprintln!("\nContext Chain:\n{}", apid_err.developer_message());
        }

        apid_err.exit_code()
    } else {
        eprintln!("Error: {error}");

        if verbose >= 1 {
            eprintln!("\nError chain:");
            for (i, cause) in error.chain().enumerate() {
                eprintln!("  {}: {}", i, cause);
            }
        }

        1
    };

    std::process::exit(exit_code)
}
