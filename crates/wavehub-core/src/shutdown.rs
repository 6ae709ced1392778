//! Cooperative shutdown scope: SIGINT/SIGTERM/SIGQUIT set a shared stop
//! flag, a worker panic converts to the same flag via a panic hook, and
//! `std::thread::scope` gives the supervisor borrow-checked join semantics
//! without an `Arc` per worker.

use std::{
    panic::PanicHookInfo,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread::{self, ScopedJoinHandle},
    time::Duration,
};

use signal_hook::{
    consts::{SIGINT, SIGQUIT, SIGTERM},
    flag as signal_flag,
};

pub struct ShutdownScope<'a, 'b: 'a> {
    pub scope: &'a thread::Scope<'a, 'b>,
    pub stop_flag: Arc<AtomicUsize>,
}

fn setup_panic_hook(stop_flag: Arc<AtomicUsize>) {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info: &PanicHookInfo<'_>| {
        stop_flag.store(SIGINT as usize, Ordering::Relaxed);
        original_hook(panic_info);
    }));
}

impl<'a, 'b: 'a> ShutdownScope<'a, 'b> {
    pub fn new(scope: &'a thread::Scope<'a, 'b>) -> Self {
        let stop_flag = Arc::new(AtomicUsize::new(0));
        const SIGTERM_U: usize = SIGTERM as usize;
        const SIGINT_U: usize = SIGINT as usize;
        const SIGQUIT_U: usize = SIGQUIT as usize;
        signal_flag::register_usize(SIGTERM, Arc::clone(&stop_flag), SIGTERM_U)
            .expect("register SIGTERM");
        signal_flag::register_usize(SIGINT, Arc::clone(&stop_flag), SIGINT_U)
            .expect("register SIGINT");
        signal_flag::register_usize(SIGQUIT, Arc::clone(&stop_flag), SIGQUIT_U)
            .expect("register SIGQUIT");

        setup_panic_hook(Arc::clone(&stop_flag));

        Self { scope, stop_flag }
    }

    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed) != 0
    }

    #[inline]
    pub fn spawn<F, T>(&self, f: F) -> ScopedJoinHandle<'a, T>
    where
        F: FnOnce() -> T + Send + 'a,
        T: Send + 'a,
    {
        self.scope.spawn(f)
    }
}
