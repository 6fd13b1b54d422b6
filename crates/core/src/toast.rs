//! Toast notifications
//!
//! [`Toaster`] forwards requests to whichever [`ToastPresenter`] is currently
//! installed. With no presenter installed every call is silently dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    /// Title used when the caller does not supply one
    #[must_use]
    pub const fn default_title(self) -> &'static str {
        match self {
            Self::Success => "成功",
            Self::Error => "错误",
            Self::Warning => "提示",
            Self::Info => "信息",
        }
    }
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastRequest {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ToastKind,
}

impl ToastRequest {
    #[must_use]
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            title: kind.default_title().to_string(),
            message: message.into(),
            kind,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Something able to display toasts
#[cfg_attr(test, mockall::automock)]
pub trait ToastPresenter: Send + Sync {
    fn show(&self, request: &ToastRequest);
    fn hide(&self);
}

/// Cloneable handle to the active presenter
#[derive(Clone, Default)]
pub struct Toaster {
    presenter: Arc<RwLock<Option<Arc<dyn ToastPresenter>>>>,
}

impl Toaster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a presenter, replacing any previous one
    pub fn set_presenter(&self, presenter: Arc<dyn ToastPresenter>) {
        *self.presenter.write().unwrap_or_else(PoisonError::into_inner) = Some(presenter);
    }

    pub fn clear_presenter(&self) {
        *self.presenter.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub fn has_presenter(&self) -> bool {
        self.current().is_some()
    }

    fn current(&self) -> Option<Arc<dyn ToastPresenter>> {
        self.presenter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn show(&self, request: &ToastRequest) {
        if let Some(presenter) = self.current() {
            presenter.show(request);
        }
    }

    pub fn hide(&self) {
        if let Some(presenter) = self.current() {
            presenter.hide();
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(&ToastRequest::new(ToastKind::Success, message));
    }

    pub fn success_titled(&self, message: impl Into<String>, title: impl Into<String>) {
        self.show(&ToastRequest::new(ToastKind::Success, message).with_title(title));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(&ToastRequest::new(ToastKind::Error, message));
    }

    pub fn error_titled(&self, message: impl Into<String>, title: impl Into<String>) {
        self.show(&ToastRequest::new(ToastKind::Error, message).with_title(title));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.show(&ToastRequest::new(ToastKind::Warning, message));
    }

    pub fn warning_titled(&self, message: impl Into<String>, title: impl Into<String>) {
        self.show(&ToastRequest::new(ToastKind::Warning, message).with_title(title));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.show(&ToastRequest::new(ToastKind::Info, message));
    }

    pub fn info_titled(&self, message: impl Into<String>, title: impl Into<String>) {
        self.show(&ToastRequest::new(ToastKind::Info, message).with_title(title));
    }
}

impl fmt::Debug for Toaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toaster")
            .field("has_presenter", &self.has_presenter())
            .finish()
    }
}
