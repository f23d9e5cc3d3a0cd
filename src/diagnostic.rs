use std::fmt;

/// Pipeline stage that produced a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Transaction,
    Ast,
    Symbols,
    Ir,
    Semantics,
    Layout,
    Binding,
    Control,
    Naming,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Transaction => "transaction",
            Stage::Ast => "ast",
            Stage::Symbols => "symbols",
            Stage::Ir => "ir",
            Stage::Semantics => "semantics",
            Stage::Layout => "layout",
            Stage::Binding => "binding",
            Stage::Control => "control",
            Stage::Naming => "naming",
        }
    }
}

/// A compiler diagnostic: a hard error, an advisory warning, or a plain
/// progress note from one of the planners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: Stage,
    pub message: String,
    /// Symbol the diagnostic is about, when there is one.
    pub symbol: Option<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Diagnostic {
    pub fn error(stage: Stage, message: String) -> Self {
        Self {
            severity: Severity::Error,
            stage,
            message,
            symbol: None,
            help: None,
        }
    }

    pub fn warning(stage: Stage, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            stage,
            message,
            symbol: None,
            help: None,
        }
    }

    pub fn note(stage: Stage, message: String) -> Self {
        Self {
            severity: Severity::Note,
            stage,
            message,
            symbol: None,
            help: None,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        };
        write!(f, "{}[{}]: {}", kind, self.stage.as_str(), self.message)?;
        if let Some(help) = &self.help {
            write!(f, "\n  = help: {}", help)?;
        }
        Ok(())
    }
}
