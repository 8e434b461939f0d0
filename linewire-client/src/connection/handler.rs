//! Line handler trait and utilities

/// Trait for handling inbound lines
pub trait LineHandler: Send {
    /// Handle one decoded line (delimiter already stripped)
    fn on_line(&mut self, line: &str);

    /// Called once when the dispatch loop stops, after the last line
    fn on_disconnect(&mut self) {}
}

/// Simple callback-based handler
pub struct CallbackHandler<F>
where
    F: FnMut(&str) + Send,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: FnMut(&str) + Send,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> LineHandler for CallbackHandler<F>
where
    F: FnMut(&str) + Send,
{
    fn on_line(&mut self, line: &str) {
        (self.callback)(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_callback_handler_receives_lines() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let mut handler = CallbackHandler::new(move |_line| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        handler.on_line("PING");
        handler.on_line("PONG");
        handler.on_line("");

        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_callback_handler_sees_line_content() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let lines_clone = lines.clone();

        let mut handler = CallbackHandler::new(move |line: &str| {
            lines_clone.lock().unwrap().push(line.to_string());
        });

        handler.on_line("hello");
        handler.on_line("world");

        let seen = lines.lock().unwrap();
        assert_eq!(*seen, vec!["hello", "world"]);
    }

    #[test]
    fn test_callback_handler_default_on_disconnect() {
        let mut handler = CallbackHandler::new(|_: &str| {});
        // Default implementation should do nothing and not panic
        handler.on_disconnect();
    }

    // Test the trait default implementation override
    struct TestHandler {
        lines: Vec<String>,
        disconnected: bool,
    }

    impl LineHandler for TestHandler {
        fn on_line(&mut self, line: &str) {
            self.lines.push(line.to_string());
        }

        fn on_disconnect(&mut self) {
            self.disconnected = true;
        }
    }

    #[test]
    fn test_handler_on_disconnect() {
        let mut handler = TestHandler {
            lines: Vec::new(),
            disconnected: false,
        };

        handler.on_line("last line");
        handler.on_disconnect();

        assert_eq!(handler.lines, vec!["last line"]);
        assert!(handler.disconnected);
    }

    // Test that CallbackHandler is Send
    fn assert_send<T: Send>() {}

    #[test]
    fn test_callback_handler_is_send() {
        assert_send::<CallbackHandler<fn(&str)>>();
    }
}
