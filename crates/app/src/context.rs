use std::sync::Arc;

use services::{AdminService, AppServices, SessionLoopService};

/// How terminal output is decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Color,
    Plain,
}

impl Theme {
    /// `NO_COLOR` (any value) or a non-terminal stdout selects plain output.
    #[must_use]
    pub fn detect() -> Self {
        use std::io::IsTerminal;
        if std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal() {
            Self::Plain
        } else {
            Self::Color
        }
    }
}

/// Everything the command handlers need, built once in `main` and passed
/// down explicitly.
#[derive(Clone)]
pub struct AppContext {
    theme: Theme,
    session_loop: Arc<SessionLoopService>,
    admin: Arc<AdminService>,
}

impl AppContext {
    #[must_use]
    pub fn new(services: &AppServices, theme: Theme) -> Self {
        Self {
            theme,
            session_loop: services.session_loop(),
            admin: services.admin(),
        }
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Same context, but sessions start with their questions shuffled.
    #[must_use]
    pub fn with_shuffled_questions(self) -> Self {
        let session_loop = (*self.session_loop).clone().with_shuffle_questions(true);
        Self {
            session_loop: Arc::new(session_loop),
            ..self
        }
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn admin(&self) -> Arc<AdminService> {
        Arc::clone(&self.admin)
    }
}
