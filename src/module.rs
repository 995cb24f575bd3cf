// Ordered request-handler chain. Modules are registered once, in a fixed
// order, and walked in that order for every request until one HANDLEs or
// ERRORs; if every module DECLINEs, the core synthesizes a 404.

use crate::config::Config;
use crate::error::Result;
use crate::http::Request;
use crate::response::Response;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    Declined,
    Error,
}

/// A single request handler participating in the dispatch chain.
pub trait Module: Send + Sync {
    fn name(&self) -> &str;

    /// Called once per worker at startup, before any requests are
    /// dispatched. An error here aborts worker startup.
    fn init(&mut self, _config: &Config) -> Result<()> {
        Ok(())
    }

    fn handle(&self, req: &Request<'_>, resp: &mut Response) -> Outcome;

    /// Called once per worker at shutdown, in table order.
    fn cleanup(&mut self) {}
}

/// The compile-time-ordered module table, constructed once at worker
/// startup and shared (read-only, after init) across every connection.
pub struct ModuleChain {
    modules: Vec<Box<dyn Module>>,
}

impl ModuleChain {
    pub fn new(modules: Vec<Box<dyn Module>>) -> Self {
        Self { modules }
    }

    pub fn init_all(&mut self, config: &Config) -> Result<()> {
        for module in &mut self.modules {
            module.init(config)?;
        }
        Ok(())
    }

    /// Walk the chain in order. Returns the outcome of whichever module
    /// stopped the walk (Handled or Error), or Declined if every module
    /// declined.
    pub fn dispatch(&self, req: &Request<'_>, resp: &mut Response) -> Outcome {
        for module in &self.modules {
            match module.handle(req, resp) {
                Outcome::Declined => continue,
                outcome => return outcome,
            }
        }
        Outcome::Declined
    }

    pub fn cleanup_all(&mut self) {
        for module in &mut self.modules {
            module.cleanup();
        }
    }
}

/// A trivial demo module exercising the dispatch chain end to end: it
/// handles every request by writing a fixed greeting body. It never
/// touches the filesystem, so it carries none of the directory-traversal
/// concerns a real static-file module would have to solve.
pub struct EchoModule;

impl Module for EchoModule {
    fn name(&self) -> &str {
        "echo"
    }

    fn handle(&self, _req: &Request<'_>, resp: &mut Response) -> Outcome {
        resp.set_status(200).write(b"hello\n");
        Outcome::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::http::{Method, Version};

    fn dummy_request<'a>() -> Request<'a> {
        Request {
            method: Method::Get,
            version: Version::Http11,
            path: "/hello",
            query: None,
            headers: Vec::new(),
            body: &[],
        }
    }

    struct DeclineModule;
    impl Module for DeclineModule {
        fn name(&self) -> &str {
            "decline"
        }
        fn handle(&self, _req: &Request<'_>, _resp: &mut Response) -> Outcome {
            Outcome::Declined
        }
    }

    struct ErrorModule;
    impl Module for ErrorModule {
        fn name(&self) -> &str {
            "error"
        }
        fn handle(&self, _req: &Request<'_>, resp: &mut Response) -> Outcome {
            resp.set_status(500);
            Outcome::Error
        }
    }

    #[test]
    fn handled_stops_the_chain() {
        let chain = ModuleChain::new(vec![Box::new(EchoModule), Box::new(ErrorModule)]);
        let mut arena = Arena::new();
        let _ = &mut arena;
        let req = dummy_request();
        let mut resp = Response::new();
        assert_eq!(chain.dispatch(&req, &mut resp), Outcome::Handled);
        assert_eq!(resp.status, 200);
    }

    #[test]
    fn all_declined_yields_declined_outcome() {
        let chain = ModuleChain::new(vec![Box::new(DeclineModule), Box::new(DeclineModule)]);
        let req = dummy_request();
        let mut resp = Response::new();
        assert_eq!(chain.dispatch(&req, &mut resp), Outcome::Declined);
    }

    #[test]
    fn error_stops_the_chain_without_trying_later_modules() {
        let chain = ModuleChain::new(vec![Box::new(ErrorModule), Box::new(EchoModule)]);
        let req = dummy_request();
        let mut resp = Response::new();
        assert_eq!(chain.dispatch(&req, &mut resp), Outcome::Error);
        assert_eq!(resp.status, 500);
    }
}
