#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use meli_price_watch::error::{Error, Result};
use meli_price_watch::products::{NewProduct, Price, ProductApi, TrackedProduct};
use serde_json::json;
use tokio::sync::oneshot;

/// Sign an identity token the way the provider would, with a key we own
pub fn id_token(email: &str) -> String {
    encode(
        &Header::default(),
        &json!({
            "sub": "5b1e2f9a-0c6d-4d55-a0f4-2f0c3a3e7b11",
            "email": email,
            "token_use": "id",
            "aud": "5f5au2pifdhpl45ujoeac09nd9",
            "exp": 1_700_000_000u64
        }),
        &EncodingKey::from_secret(b"test-signing-key"),
    )
    .unwrap()
}

pub fn product(id: &str, threshold: f64, last_checked: Option<f64>) -> TrackedProduct {
    TrackedProduct {
        id: id.to_string(),
        url: format!("https://articulo.mercadolibre.com.ar/MLA-{}", id),
        title: Some(format!("Listing {}", id)),
        threshold: Price::new(threshold).unwrap(),
        last_checked_price: last_checked.and_then(Price::new),
    }
}

pub fn ids(products: &[TrackedProduct]) -> Vec<&str> {
    products.iter().map(|p| p.id.as_str()).collect()
}

/// In-process product API whose calls can be held open and released in any
/// order.
#[derive(Default)]
pub struct ScriptedApi {
    products: Mutex<Vec<TrackedProduct>>,
    added: Mutex<Vec<NewProduct>>,
    add_failure: Mutex<Option<Error>>,
    list_gates: Mutex<VecDeque<oneshot::Receiver<Result<Vec<TrackedProduct>>>>>,
    remove_gates: Mutex<VecDeque<oneshot::Receiver<Result<()>>>>,
    list_tokens: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
    add_calls: AtomicUsize,
    remove_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn with_products(products: Vec<TrackedProduct>) -> Self {
        Self {
            products: Mutex::new(products),
            ..Default::default()
        }
    }

    /// Hold the next `list` call until the returned sender fires
    pub fn gate_list(&self) -> oneshot::Sender<Result<Vec<TrackedProduct>>> {
        let (tx, rx) = oneshot::channel();
        self.list_gates.lock().unwrap().push_back(rx);
        tx
    }

    /// Hold the next `remove` call until the returned sender fires
    pub fn gate_remove(&self) -> oneshot::Sender<Result<()>> {
        let (tx, rx) = oneshot::channel();
        self.remove_gates.lock().unwrap().push_back(rx);
        tx
    }

    /// Make the next `add` fail with `error`
    pub fn fail_next_add(&self, error: Error) {
        *self.add_failure.lock().unwrap() = Some(error);
    }

    pub fn added(&self) -> Vec<NewProduct> {
        self.added.lock().unwrap().clone()
    }

    /// Tokens sent with each `list` call, in call order
    pub fn list_tokens(&self) -> Vec<String> {
        self.list_tokens.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.list_calls() + self.add_calls() + self.remove_calls()
    }
}

#[async_trait]
impl ProductApi for ScriptedApi {
    async fn list(&self, token: &str) -> Result<Vec<TrackedProduct>> {
        self.list_tokens.lock().unwrap().push(token.to_string());
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.list_gates.lock().unwrap().pop_front();
        match gate {
            Some(rx) => rx.await.unwrap(),
            None => Ok(self.products.lock().unwrap().clone()),
        }
    }

    async fn add(&self, _token: &str, new: &NewProduct) -> Result<()> {
        let n = self.add_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.add_failure.lock().unwrap().take() {
            return Err(error);
        }
        self.added.lock().unwrap().push(new.clone());
        self.products.lock().unwrap().push(TrackedProduct {
            id: format!("srv-{}", n),
            url: new.url.clone(),
            title: None,
            threshold: new.threshold,
            last_checked_price: None,
        });
        Ok(())
    }

    async fn remove(&self, _token: &str, id: &str) -> Result<()> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.remove_gates.lock().unwrap().pop_front();
        match gate {
            Some(rx) => rx.await.unwrap(),
            None => {
                self.products.lock().unwrap().retain(|p| p.id != id);
                Ok(())
            }
        }
    }
}

/// Let spawned tasks run until `done` holds
pub async fn settle<F: Fn() -> bool>(done: F) {
    for _ in 0..1_000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}
