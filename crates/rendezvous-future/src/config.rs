//! Configuration for the producer's worker thread.

/// Default name given to producer worker threads.
pub const DEFAULT_THREAD_NAME: &str = "rendezvous-producer";

/// Configuration for spawning a [`Future`](crate::Future)'s worker thread.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the worker thread, visible in panic messages and debuggers.
    ///
    /// Default: `"rendezvous-producer"`
    pub thread_name: Option<String>,

    /// Stack size of the worker thread in bytes.
    ///
    /// `None` uses the platform default (see `std::thread::Builder`).
    /// Producers with deep recursion or large on-stack tables may need more.
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thread_name: Some(DEFAULT_THREAD_NAME.to_owned()),
            stack_size: None,
        }
    }
}

impl Config {
    /// Creates a configuration with an unnamed worker thread and default stack.
    pub fn anonymous() -> Self {
        Self {
            thread_name: None,
            stack_size: None,
        }
    }

    /// Sets the worker thread name.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    /// Sets the worker thread stack size in bytes.
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    pub(crate) fn thread_builder(&self) -> std::thread::Builder {
        let mut builder = std::thread::Builder::new();
        if let Some(name) = &self.thread_name {
            builder = builder.name(name.clone());
        }
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }
        builder
    }
}
