use log::debug;
use signal_hook::consts::{SIGINT, SIGTERM};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// ポーリングループの停止を伝えるためのキャンセルトークン
///
/// 別スレッドやシグナルハンドラから共有される唯一の可変状態。
#[derive(Clone, Debug, Default)]
pub struct ShutdownContext {
    shutdown: Arc<AtomicBool>,
}

impl ShutdownContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            debug!("Shutdown requested.");
        }
    }

    /// SIGINTとSIGTERMを受信したらキャンセルされるように登録する。
    pub fn register_signals(&self) -> io::Result<()> {
        for signal in [SIGINT, SIGTERM] {
            signal_hook::flag::register(signal, self.shutdown.clone())?;
        }
        Ok(())
    }
}
