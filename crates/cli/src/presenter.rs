//! Terminal toast presenter

use echo_core::{ToastKind, ToastPresenter, ToastRequest};
use std::io::Write;
use std::sync::{Mutex, PoisonError};

/// Writes each toast as a single line
pub struct TerminalPresenter<W: Write + Send> {
    out: Mutex<W>,
}

impl TerminalPresenter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalPresenter<W> {
    pub const fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

const fn marker(kind: ToastKind) -> &'static str {
    match kind {
        ToastKind::Success => "✔",
        ToastKind::Error => "✘",
        ToastKind::Warning => "!",
        ToastKind::Info => "i",
    }
}

impl<W: Write + Send> ToastPresenter for TerminalPresenter<W> {
    fn show(&self, request: &ToastRequest) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // Write failures are ignored
        let _ = writeln!(
            out,
            "[{}] {}: {}",
            marker(request.kind),
            request.title,
            request.message
        );
        let _ = out.flush();
    }

    fn hide(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use echo_core::Toaster;
    use std::sync::Arc;

    #[test]
    fn toasts_render_one_line_each() {
        let presenter = Arc::new(TerminalPresenter::new(Vec::new()));
        let toaster = Toaster::new();
        toaster.set_presenter(presenter.clone());

        toaster.success("登录成功");
        toaster.error_titled("密码错误", "登录");
        toaster.clear_presenter();

        let presenter = Arc::try_unwrap(presenter).ok().unwrap();
        let output = String::from_utf8(presenter.into_inner()).unwrap();
        assert_eq!(output, "[✔] 成功: 登录成功\n[✘] 登录: 密码错误\n");
    }
}
