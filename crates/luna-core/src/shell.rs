use std::sync::{Arc, PoisonError, RwLock};

/// The shell every newly spawned session runs.
///
/// Process-wide on purpose: the `shell` control command changes it for all
/// future spawns, not only for the session that issued the command. Every
/// read sees the latest write; nothing caches the value.
#[derive(Clone, Debug)]
pub struct ShellDefault {
    shell: Arc<RwLock<String>>,
}

impl ShellDefault {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: Arc::new(RwLock::new(shell.into())),
        }
    }

    /// Start from the user's login shell.
    pub fn from_env() -> Self {
        Self::new(user_shell())
    }

    pub fn get(&self) -> String {
        self.shell
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, shell: impl Into<String>) {
        *self.shell.write().unwrap_or_else(PoisonError::into_inner) = shell.into();
    }
}

/// Returns the user's default shell, falling back to `/bin/sh`.
pub fn user_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|shell| !shell.is_empty())
        .unwrap_or_else(|| "/bin/sh".to_string())
}
