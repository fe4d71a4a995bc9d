use std::net::{SocketAddr, TcpListener};
use std::thread::JoinHandle;

use tokio::sync::oneshot;

use crate::config::{RemoteConfig, ServerOptions};
use crate::error::RemoteError;
use crate::executor::ExecutorHandle;
use crate::handlers;
use crate::host::RemoteHost;

struct RunningServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    thread: JoinHandle<Result<(), RemoteError>>,
}

/// The protocol server, serving from its own thread.
///
/// Requests are answered on the serving thread; everything that touches the
/// application state is sent to the main thread through the executor handle.
///
/// # Example
///
/// ```no_run
/// use bat_remote::{MainThreadExecutor, RemoteConfig, RemoteServer, ServerOptions};
/// use bat_scene::camera::RenderSettings;
/// use bat_scene::Scene;
///
/// let mut executor = MainThreadExecutor::new(Scene::new(RenderSettings::new(640, 480)));
/// let mut server = RemoteServer::new(executor.handle(), RemoteConfig::default(), ServerOptions::default());
/// server.start().unwrap();
///
/// loop {
///     executor.tick();
///     std::thread::sleep(std::time::Duration::from_secs(1));
/// }
/// ```
pub struct RemoteServer<H: RemoteHost> {
    executor: ExecutorHandle<H>,
    config: RemoteConfig,
    options: ServerOptions,
    running: Option<RunningServer>,
}

impl<H: RemoteHost> RemoteServer<H> {
    /// Create a stopped server.
    pub fn new(executor: ExecutorHandle<H>, config: RemoteConfig, options: ServerOptions) -> Self {
        Self {
            executor,
            config,
            options,
            running: None,
        }
    }

    /// The current configuration.
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Whether the server is listening.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// The address the server listens on, if running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.addr)
    }

    /// Start listening on the configured port.
    ///
    /// Does nothing if the server is already running or disabled in the
    /// configuration.
    ///
    /// # Errors
    ///
    /// If the port is invalid or cannot be bound.
    pub fn start(&mut self) -> Result<(), RemoteError> {
        if self.running.is_some() {
            return Ok(());
        }
        if !self.config.http_enable {
            log::info!("the remote server is disabled");
            return Ok(());
        }
        self.config.validate()?;

        let addr = SocketAddr::new(self.options.host, self.config.http_port);
        let listener = TcpListener::bind(addr).map_err(|source| RemoteError::Bind { addr, source })?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let app = handlers::router(self.executor.clone(), self.options);
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let thread = std::thread::spawn(move || -> Result<(), RemoteError> {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener)?;
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
            })?;
            Ok(())
        });

        log::info!("🔥 Listening on: http://{addr}");
        self.running = Some(RunningServer {
            addr,
            shutdown,
            thread,
        });
        Ok(())
    }

    /// Stop the server and wait for the serving thread.
    ///
    /// Does nothing if the server is not running.
    pub fn stop(&mut self) -> Result<(), RemoteError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        // the receiver is gone if the server already failed
        let _ = running.shutdown.send(());
        let result = running
            .thread
            .join()
            .map_err(|_| RemoteError::ServerPanicked)?;

        log::info!("stopped the server on {}", running.addr);
        result
    }

    /// Stop and start the server.
    pub fn restart(&mut self) -> Result<(), RemoteError> {
        self.stop()?;
        self.start()
    }

    /// Apply new user preferences.
    ///
    /// Disabling stops the server, a new port restarts it and anything else
    /// makes sure it is running. An invalid configuration is rejected and the
    /// server keeps its current state.
    pub fn apply_config(&mut self, config: RemoteConfig) -> Result<(), RemoteError> {
        config.validate()?;
        let port_changed = config.http_port != self.config.http_port;
        self.config = config;

        if !config.http_enable {
            self.stop()
        } else if port_changed {
            log::info!("port changed to {}, restarting the server", config.http_port);
            self.restart()
        } else {
            self.start()
        }
    }
}

impl<H: RemoteHost> Drop for RemoteServer<H> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("failed to stop the server: {e}");
        }
    }
}
