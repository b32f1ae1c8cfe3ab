use std::env;
use std::sync::Arc;

use dotenv::dotenv;
use meli_price_watch::prelude::*;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: price_watch <login | callback <url> | list | add <url> <price> | remove <id> | logout>";

fn print_products(dashboard: &ProductSync) {
    if let Some(error) = dashboard.error() {
        println!("! {}", error);
    }

    let products = dashboard.products();
    if products.is_empty() {
        println!("You are not tracking any product yet.");
        return;
    }

    for product in products {
        let marker = match product.status() {
            PriceStatus::Below => "[below]",
            PriceStatus::Equal => "[equal]",
            PriceStatus::Above => "[above]",
        };
        let price = product
            .last_checked_price
            .map(|price| format!("${}", price))
            .unwrap_or_else(|| "not checked yet".to_string());

        println!(
            "{} {} {}\n    current: {}  wanted: ${}\n    {}",
            marker,
            product.id,
            product.title.as_deref().unwrap_or("(untitled)"),
            price,
            product.threshold,
            product.url
        );
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = ClientOptions::from_env()?;
    let store_path = env::var("PRICE_WATCH_STORE").unwrap_or_else(|_| ".price-watch.json".to_string());

    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("list");

    // The callback URL stands in for the page the provider redirected to.
    let location = match (command, args.get(1)) {
        ("callback", Some(url)) => url.clone(),
        _ => options.redirect_uri.clone(),
    };

    let navigator = Arc::new(MemoryNavigator::parse(&location)?);
    let store = Arc::new(FileStore::new(&store_path));
    let app = PriceWatch::with_http(options, store, navigator.clone())?;

    match command {
        "login" => {
            app.login()?;
        }
        "logout" => {
            app.logout()?;
            println!("Signed out.");
        }
        "callback" | "list" | "add" | "remove" => {
            let Some(dashboard) = app.start().await else {
                println!("Not signed in. Run `price_watch login` first.");
                return Ok(());
            };

            if let Some(email) = app.session().and_then(|session| session.email) {
                println!("Signed in as {}", email);
            }

            match (command, args.get(1), args.get(2)) {
                ("add", Some(url), Some(price)) => {
                    dashboard.set_draft_url(url.as_str());
                    dashboard.set_draft_threshold(price.as_str());
                    if dashboard.submit_draft().await.is_ok() {
                        println!("Now tracking {}", url);
                    }
                }
                ("remove", Some(id), _) => {
                    if dashboard.delete(id).await.is_ok() {
                        println!("Stopped tracking {}", id);
                    }
                }
                ("add", _, _) | ("remove", _, _) => {
                    println!("{}", USAGE);
                    return Ok(());
                }
                _ => {}
            }

            print_products(&dashboard);
        }
        _ => {
            println!("{}", USAGE);
            return Ok(());
        }
    }

    for url in navigator.assigned() {
        println!("Open this URL in your browser:\n{}", url);
    }

    Ok(())
}
