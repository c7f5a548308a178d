use std::cell::{Cell, RefCell};

use anyhow::Result;
use rquickjs::Function;

use super::engine::ScriptEngine;
use super::script::{command_injection, PlayerDocument};
use crate::transport::{InboundSender, Transport, TransportError};

const BOOTSTRAP_FILENAME: &str = "vimeo-bridge-bootstrap.js";
const COMMAND_FILENAME: &str = "vimeo-bridge-command.js";

const IPC_SHIM: &str = r#"
window.ipc = {
    postMessage: function (raw) { __vimeo_bridge_post(String(raw)); }
};
"#;

/// In-process web view stand-in that runs the generated bootstrap in QuickJS.
///
/// Outbound posts from the page (`window.ipc.postMessage`) land on the
/// inbound channel. Scripts added with [`HeadlessWebView::preload`] play the
/// role of the page's external `<script src>` tags and run before every
/// bootstrap, so [`Transport::load`] always starts from a fresh context.
pub struct HeadlessWebView {
    outbound: InboundSender,
    engine: RefCell<ScriptEngine>,
    preloads: RefCell<Vec<(String, String)>>,
    open: Cell<bool>,
}

impl HeadlessWebView {
    pub fn new(outbound: InboundSender) -> Result<Self> {
        let engine = fresh_engine(&outbound)?;
        Ok(Self {
            outbound,
            engine: RefCell::new(engine),
            preloads: RefCell::new(Vec::new()),
            open: Cell::new(true),
        })
    }

    /// Evaluate `source` now and again before every future bootstrap.
    pub fn preload(&self, source: &str, filename: &str) -> Result<()> {
        self.engine.borrow().eval(source, filename)?;
        self.preloads
            .borrow_mut()
            .push((source.to_string(), filename.to_string()));
        Ok(())
    }

    pub fn eval(&self, source: &str) -> Result<()> {
        self.engine.borrow().eval(source, "host.js")
    }

    pub fn eval_with<V>(&self, source: &str) -> Result<V>
    where
        V: for<'js> rquickjs::FromJs<'js>,
    {
        self.engine.borrow().eval_with(source, "host.js")
    }

    pub fn close(&self) {
        self.open.set(false);
    }
}

impl Transport for HeadlessWebView {
    fn load(&self, document: &PlayerDocument) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }

        let engine = fresh_engine(&self.outbound).map_err(script_error)?;
        for (source, filename) in self.preloads.borrow().iter() {
            engine.eval(source, filename).map_err(script_error)?;
        }
        if let Some(bootstrap) = &document.bootstrap {
            engine
                .eval(bootstrap, BOOTSTRAP_FILENAME)
                .map_err(script_error)?;
        }

        let mut current = self
            .engine
            .try_borrow_mut()
            .map_err(|_| TransportError::Busy)?;
        *current = engine;
        Ok(())
    }

    fn send(&self, payload: &str) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        let engine = self
            .engine
            .try_borrow()
            .map_err(|_| TransportError::Busy)?;
        engine
            .eval(&command_injection(payload), COMMAND_FILENAME)
            .map_err(script_error)
    }

    fn is_open(&self) -> bool {
        self.open.get() && !self.outbound.is_closed()
    }
}

fn fresh_engine(outbound: &InboundSender) -> Result<ScriptEngine> {
    let engine = ScriptEngine::new()?;
    let sender = outbound.clone();
    engine.with_context(move |ctx| {
        let post = Function::new(ctx.clone(), move |raw: String| {
            if sender.send(raw).is_err() {
                tracing::debug!(target: "quickjs", "host is gone, message dropped");
            }
        })?
        .with_name("__vimeo_bridge_post")?;
        ctx.globals().set("__vimeo_bridge_post", post)?;
        Ok(())
    })?;
    engine.eval(IPC_SHIM, "ipc-shim.js")?;
    Ok(engine)
}

fn script_error(err: anyhow::Error) -> TransportError {
    TransportError::Script(format!("{err:#}"))
}
