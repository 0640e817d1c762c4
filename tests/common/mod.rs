//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use vttstitch::error::{Result, VttError};
use vttstitch::server::build_router;
use vttstitch::translate::Translator;

/// Uppercases its input; fails on any text containing "fail"
#[derive(Default)]
pub struct FakeTranslator {
    pub calls: AtomicUsize,
}

impl FakeTranslator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.contains("fail") {
            Err(VttError::Translation("model crashed".to_string()))
        } else {
            Ok(text.to_uppercase())
        }
    }
}

/// Serve `translator` on an ephemeral local port
pub async fn spawn_server(translator: Arc<dyn Translator>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build_router(translator, &[]);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    addr
}
