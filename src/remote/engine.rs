use anyhow::{Context as AnyhowContext, Result};
use rquickjs::{Context, Ctx, Error as JsError, Function, Runtime, Value};

const MAX_JOBS: usize = 1000;

/// QuickJS runtime hosting a remote player context.
///
/// Installs a `console` that forwards to `tracing` and the handful of browser
/// globals the player bootstrap expects (`self`, `window`).
pub struct ScriptEngine {
    runtime: Runtime,
    context: Context,
}

impl ScriptEngine {
    pub fn new() -> Result<Self> {
        let runtime = Runtime::new().context("failed to create QuickJS runtime")?;
        let context = Context::full(&runtime).context("failed to create QuickJS context")?;
        let engine = Self { runtime, context };
        engine.init_globals()?;
        Ok(engine)
    }

    pub fn eval(&self, source: &str, filename: &str) -> Result<()> {
        self.eval_with::<()>(source, filename)
    }

    /// Evaluate a script, then drain the job queue so promise continuations
    /// (and therefore command replies) run before returning.
    pub fn eval_with<V>(&self, source: &str, filename: &str) -> Result<V>
    where
        V: for<'js> rquickjs::FromJs<'js>,
    {
        let script = with_source_url(source, filename);
        let value = self
            .context
            .with(|ctx| match ctx.eval::<V, _>(script) {
                Ok(value) => Ok(value),
                Err(JsError::Exception) => Err(anyhow::anyhow!(
                    capture_exception_message(&ctx)
                        .unwrap_or_else(|| "QuickJS exception".to_string())
                )),
                Err(err) => Err(anyhow::Error::from(err)),
            })
            .with_context(|| format!("failed to evaluate {filename}"))?;

        self.run_pending_jobs();
        Ok(value)
    }

    /// Execute queued promise jobs. Returns how many ran.
    pub fn run_pending_jobs(&self) -> usize {
        let mut job_count = 0;
        while self.runtime.is_job_pending() {
            match self.runtime.execute_pending_job() {
                Ok(true) => {
                    job_count += 1;
                    if job_count >= MAX_JOBS {
                        tracing::warn!(
                            target: "quickjs",
                            "stopped processing jobs after {} iterations",
                            MAX_JOBS
                        );
                        break;
                    }
                }
                Ok(false) => break,
                Err(job_exception) => {
                    tracing::error!(target: "quickjs", "job execution error: {:?}", job_exception);
                    break;
                }
            }
        }
        job_count
    }

    pub fn with_context<T, F>(&self, f: F) -> Result<T>
    where
        F: for<'js> FnOnce(Ctx<'js>) -> rquickjs::Result<T>,
    {
        self.context.with(f).map_err(anyhow::Error::from)
    }

    fn init_globals(&self) -> Result<()> {
        self.context
            .with(|ctx| {
                let log_fn = Function::new(ctx.clone(), log_from_js)?.with_name("__vimeo_log")?;
                ctx.globals().set("__vimeo_log", log_fn)?;
                ctx.eval::<(), _>(GLOBALS_BOOTSTRAP.as_bytes())
            })
            .map_err(anyhow::Error::from)
    }
}

fn with_source_url(source: &str, filename: &str) -> Vec<u8> {
    let mut script = String::with_capacity(source.len() + filename.len() + 32);
    script.push_str(source);
    if !source.ends_with('\n') {
        script.push('\n');
    }
    script.push_str("//# sourceURL=");
    script.push_str(filename);
    script.push('\n');
    script.into_bytes()
}

fn log_from_js(level: String, message: String) -> rquickjs::Result<()> {
    match level.as_str() {
        "error" => tracing::error!(target: "quickjs", "{message}"),
        "warn" => tracing::warn!(target: "quickjs", "{message}"),
        "debug" => tracing::debug!(target: "quickjs", "{message}"),
        _ => tracing::info!(target: "quickjs", "{message}"),
    }
    Ok(())
}

fn capture_exception_message(ctx: &Ctx<'_>) -> Option<String> {
    let exception: Value = ctx.catch();

    if let Some(obj) = exception.as_object() {
        if let Ok(message) = obj.get::<_, String>("message") {
            if let Ok(stack) = obj.get::<_, String>("stack") {
                return Some(format!("Error: {}\nStack: {}", message, stack));
            }
            return Some(format!("Error: {}", message));
        }
    }

    Some(format!("{:?}", exception))
}

const GLOBALS_BOOTSTRAP: &str = r#"
(() => {
    const global = globalThis;
    if (typeof global.self === 'undefined') {
        global.self = global;
    }
    if (typeof global.window === 'undefined') {
        global.window = global;
    }

    const stringify = (value) => {
        try {
            if (typeof value === 'string') {
                return value;
            }
            if (value === undefined) {
                return 'undefined';
            }
            if (value === null) {
                return 'null';
            }
            if (typeof value === 'object') {
                return JSON.stringify(value);
            }
            return String(value);
        } catch (err) {
            return '[unprintable]';
        }
    };

    const logAt = (level) => (...args) => {
        try {
            global.__vimeo_log(level, args.map(stringify).join(' '));
        } catch (err) {
            // console must never throw
        }
    };

    global.console = {
        log: logAt('info'),
        info: logAt('info'),
        warn: logAt('warn'),
        error: logAt('error'),
        debug: logAt('debug'),
    };
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_inline_script() {
        let engine = ScriptEngine::new().unwrap();
        let result: i32 = engine
            .eval_with(
                "(() => { console.log('hello', { a: 1 }); return 40 + 2; })()",
                "engine_test.js",
            )
            .unwrap();
        assert_eq!(result, 42);
    }

    #[test]
    fn exposes_window_alias() {
        let engine = ScriptEngine::new().unwrap();
        let same: bool = engine.eval_with("window === globalThis", "window.js").unwrap();
        assert!(same);
    }

    #[test]
    fn drains_promise_jobs_after_eval() {
        let engine = ScriptEngine::new().unwrap();
        engine
            .eval(
                "globalThis.settled = false; Promise.resolve(1).then(() => { globalThis.settled = true; });",
                "promise.js",
            )
            .unwrap();
        let settled: bool = engine.eval_with("globalThis.settled", "check.js").unwrap();
        assert!(settled);
    }

    #[test]
    fn reports_thrown_errors() {
        let engine = ScriptEngine::new().unwrap();
        let err = engine
            .eval("throw new Error('boom')", "throw.js")
            .unwrap_err();
        assert!(format!("{err:#}").contains("boom"));
    }
}
