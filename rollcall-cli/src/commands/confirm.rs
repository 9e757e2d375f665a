//! Interactive per-account confirmation for clean mode.

use dialoguer::Confirm as Prompt;
use tracing::warn;

/// Asks on the terminal before each stray account is removed.
///
/// Any prompt failure (no TTY, interrupted input) counts as "no".
#[derive(Debug, Default)]
pub struct TerminalConfirm;

impl rollcall_sync::Confirm for TerminalConfirm {
    fn confirm(&mut self, email: &str) -> bool {
        let prompt = Prompt::new()
            .with_prompt(format!("Remove {email} from all systems?"))
            .default(false);
        match prompt.interact() {
            Ok(answer) => answer,
            Err(err) => {
                warn!(email, error = %err, "confirmation prompt failed, keeping account");
                false
            }
        }
    }
}
