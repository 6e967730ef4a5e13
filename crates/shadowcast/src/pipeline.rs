//! Recomputation pipeline: a fixed pool of workers turning configuration
//! changes into persisted scenes.
//!
//! Model
//! - One shared, unbounded intake queue; `N` identical workers compete for it,
//!   so requests may complete (and persist) in any order. The repository's
//!   own lock serializes the writes; the last upsert wins.
//! - Every request names a response route. Routes are fixed when the
//!   [`RouteTable`] is built and never change afterwards; an unknown route is
//!   rejected at submit time instead of stalling a worker.
//! - Route channels are rendezvous channels: a worker blocks until the caller
//!   reads its reply. Callers should use a route no concurrent caller shares.
//!
//! Shutdown closes the intake and joins the workers; queued requests that no
//! worker picked up are dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};

use crate::config::{Configuration, ScanCfg};
use crate::ctx::Ctx;
use crate::error::{Error, Result};
use crate::scene::Scene;
use crate::store::SceneRepository;

/// A configuration change waiting to be processed.
#[derive(Clone, Debug)]
pub struct Request {
    pub ctx: Ctx,
    pub config: Configuration,
    pub route: String,
}

/// Outcome of one request: the persisted scene or the error that stopped it.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub result: Result<Scene>,
}

#[derive(Debug)]
struct Route {
    tx: Sender<Reply>,
    rx: Receiver<Reply>,
}

/// Fixed set of response routes, keyed by name.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<String, Route>,
}

impl RouteTable {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let routes = keys
            .into_iter()
            .map(|k| {
                let (tx, rx) = bounded(0);
                (k.into(), Route { tx, rx })
            })
            .collect();
        Self { routes }
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.routes.contains_key(key)
    }

    fn route(&self, key: &str) -> Result<&Route> {
        self.routes
            .get(key)
            .ok_or_else(|| Error::UnknownRoute(key.to_string()))
    }
}

/// Handle to the running worker pool.
pub struct Pipeline {
    intake: Option<Sender<Request>>,
    done: Option<Sender<()>>,
    routes: Arc<RouteTable>,
    workers: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Start `workers` workers (at least one) with default scan offsets.
    pub fn start(repo: Arc<SceneRepository>, routes: RouteTable, workers: usize) -> Self {
        Self::start_with_cfg(repo, routes, workers, ScanCfg::default())
    }

    pub fn start_with_cfg(
        repo: Arc<SceneRepository>,
        routes: RouteTable,
        workers: usize,
        cfg: ScanCfg,
    ) -> Self {
        let (intake_tx, intake_rx) = unbounded::<Request>();
        let (done_tx, done_rx) = bounded::<()>(0);
        let routes = Arc::new(routes);
        let n = workers.max(1);
        tracing::debug!(workers = n, routes = routes.routes.len(), "starting pipeline");

        let handles = (0..n)
            .map(|id| {
                let worker = Worker {
                    id,
                    intake: intake_rx.clone(),
                    done: done_rx.clone(),
                    routes: Arc::clone(&routes),
                    repo: Arc::clone(&repo),
                    cfg,
                };
                thread::spawn(move || worker.run())
            })
            .collect();

        Self {
            intake: Some(intake_tx),
            done: Some(done_tx),
            routes,
            workers: handles,
        }
    }

    /// Enqueue a request. Fails fast on an unknown route or a malformed
    /// configuration; nothing reaches the geometry layer in that case.
    pub fn submit(&self, ctx: Ctx, config: Configuration, route: &str) -> Result<()> {
        self.routes.route(route)?;
        config.check()?;
        let intake = self.intake.as_ref().ok_or(Error::PipelineClosed)?;
        intake
            .send(Request {
                ctx,
                config,
                route: route.to_string(),
            })
            .map_err(|_| Error::PipelineClosed)
    }

    /// Block until a reply arrives on `route`.
    pub fn recv(&self, route: &str) -> Result<Scene> {
        let reply = self
            .routes
            .route(route)?
            .rx
            .recv()
            .map_err(|_| Error::PipelineClosed)?;
        reply.result
    }

    /// Submit and wait for the reply on the same route.
    pub fn reload(&self, ctx: Ctx, config: Configuration, route: &str) -> Result<Scene> {
        self.submit(ctx, config, route)?;
        self.recv(route)
    }

    #[inline]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Close the intake and wait for every worker to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.intake.take();
        self.done.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("pipeline worker panicked");
            }
        }
        tracing::debug!("pipeline stopped");
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.stop();
        }
    }
}

struct Worker {
    id: usize,
    intake: Receiver<Request>,
    done: Receiver<()>,
    routes: Arc<RouteTable>,
    repo: Arc<SceneRepository>,
    cfg: ScanCfg,
}

impl Worker {
    fn run(self) {
        loop {
            select! {
                recv(self.intake) -> msg => match msg {
                    Ok(request) => {
                        if !self.handle(request) {
                            return;
                        }
                    }
                    Err(_) => return,
                },
                recv(self.done) -> _ => return,
            }
        }
    }

    /// Process one request; `false` once the pipeline is shutting down.
    fn handle(&self, request: Request) -> bool {
        let start = Instant::now();
        let Request { ctx, config, route } = request;

        let scene = Scene::from_config(&config).with_cfg(self.cfg);
        let result = scene.load(&ctx, self.repo.as_ref());
        if let Err(e) = &result {
            tracing::warn!(worker = self.id, route = %route, error = %e, "recomputation failed");
        }

        // Routes were checked on submit; a missing one here means the
        // table is shared with another pipeline, so drop the reply.
        let Ok(target) = self.routes.route(&route) else {
            tracing::warn!(worker = self.id, route = %route, "reply dropped");
            return true;
        };
        let delivered = select! {
            send(target.tx, Reply { result }) -> res => res.is_ok(),
            recv(self.done) -> _ => false,
        };
        tracing::info!(
            worker = self.id,
            polygons = config.polygons.len(),
            elapsed = ?start.elapsed(),
            "config containing ({}) polygons processed",
            config.polygons.len()
        );
        delivered
    }
}
