//! Process-lifetime extension registries.
//!
//! Every registry is append-only: plugins register entries while the host is
//! being wired up, and the build reads them many times concurrently
//! afterwards. No removal operation exists. Reads are lock-guarded as well,
//! so late registration cannot race a running build.

pub mod command;
pub mod hooks;
pub mod parser;
pub mod resolver;

use std::sync::{Arc, RwLock};

use reqwest::Url;

type AcceptorFn = dyn Fn(&Url) -> bool + Send + Sync;

/// Ordered list of repository acceptors. An acceptor that returns true for a
/// repo URI vouches for it, letting `add_repo` skip the reachability ping.
#[derive(Default)]
pub struct RepoAcceptors {
    acceptors: RwLock<Vec<Arc<AcceptorFn>>>,
}

impl std::fmt::Debug for RepoAcceptors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.acceptors.read().unwrap().len();
        f.debug_struct("RepoAcceptors").field("count", &count).finish()
    }
}

impl RepoAcceptors {
    pub fn register<F>(&self, acceptor: F)
    where
        F: Fn(&Url) -> bool + Send + Sync + 'static,
    {
        self.acceptors.write().unwrap().push(Arc::new(acceptor));
    }

    pub fn accepts(&self, repo: &Url) -> bool {
        let acceptors: Vec<_> = self.acceptors.read().unwrap().iter().cloned().collect();
        acceptors.iter().any(|a| a(repo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_acceptors_means_no_vouching() {
        let acceptors = RepoAcceptors::default();
        let url = Url::parse("https://repo.example.com").unwrap();
        assert!(!acceptors.accepts(&url));
    }

    #[test]
    fn any_acceptor_vouches() {
        let acceptors = RepoAcceptors::default();
        acceptors.register(|_| false);
        acceptors.register(|url: &Url| url.host_str() == Some("repo.example.com"));

        let yes = Url::parse("https://repo.example.com").unwrap();
        let no = Url::parse("https://other.example.com").unwrap();
        assert!(acceptors.accepts(&yes));
        assert!(!acceptors.accepts(&no));
    }
}
