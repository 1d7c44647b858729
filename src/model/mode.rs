/// Composer input modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Every configured enhancer is available.
    #[default]
    Open,
    /// Only the `restricted.enhancers` allow-list is registered.
    Restricted,
}

impl InputMode {
    pub fn label(&self) -> &'static str {
        match self {
            InputMode::Open => "CHAT",
            InputMode::Restricted => "RESTRICTED",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            InputMode::Open => InputMode::Restricted,
            InputMode::Restricted => InputMode::Open,
        }
    }
}
