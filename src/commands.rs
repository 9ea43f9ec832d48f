//! Command implementations, consuming the service's callback API

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::{ImageArgs, ThumbnailArgs};
use restofeed::{DataService, FetchError, ListingEnvelope};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;
type Outcome<T> = Result<T, FetchError>;

/// Callback pair feeding one channel. If neither fires, `recv` yields `None`
/// once both closures are dropped.
fn callbacks<T: Send + 'static>() -> (
    impl FnOnce(T) + Send + 'static,
    impl FnOnce(FetchError) + Send + 'static,
    mpsc::UnboundedReceiver<Outcome<T>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let err_tx = tx.clone();

    let on_success = move |value: T| {
        let _ = tx.send(Ok(value));
    };
    let on_error = move |e: FetchError| {
        let _ = err_tx.send(Err(e));
    };

    (on_success, on_error, rx)
}

async fn settle<T>(mut rx: mpsc::UnboundedReceiver<Outcome<T>>) -> Result<T, AnyError> {
    match rx.recv().await {
        Some(outcome) => Ok(outcome?),
        None => Err("request ended without an outcome".into()),
    }
}

async fn fetch_listing(service: &DataService) -> Result<ListingEnvelope, AnyError> {
    let (on_success, on_error, rx) = callbacks::<ListingEnvelope>();
    service.get_listing(on_success, on_error);
    settle(rx).await
}

pub async fn listing(service: &DataService) -> Result<(), AnyError> {
    let listing = fetch_listing(service).await?;
    info!(items = listing.len(), "Listing fetched");

    for item in &listing.items {
        println!(
            "{:<36} {:<14} {:<16} {:>4.1} ({:>5} reviews)  {}",
            item.name,
            item.category,
            item.location.locality,
            item.rating.value,
            item.rating.count,
            item.offer.label
        );
    }

    Ok(())
}

pub async fn image(service: &DataService, args: ImageArgs) -> Result<(), AnyError> {
    let (on_success, on_error, rx) = callbacks::<Bytes>();
    service.get_image(&args.url, on_success, on_error);
    let bytes = settle(rx).await?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, &bytes).await?;
            info!(path = %path.display(), size = bytes.len(), "Image written");
        }
        None => println!("{} bytes from {}", bytes.len(), args.url),
    }

    Ok(())
}

pub async fn thumbnails(service: &DataService, args: ThumbnailArgs) -> Result<(), AnyError> {
    let listing = fetch_listing(service).await?;
    let urls: Vec<String> = listing
        .thumbnail_urls()
        .take(args.limit.unwrap_or(usize::MAX))
        .map(str::to_string)
        .collect();

    let (tx, mut rx) = mpsc::unbounded_channel::<(String, Outcome<Bytes>)>();
    for url in &urls {
        let (ok_tx, err_tx) = (tx.clone(), tx.clone());
        let (ok_url, err_url) = (url.clone(), url.clone());
        service.get_image(
            url,
            move |bytes| {
                let _ = ok_tx.send((ok_url, Ok(bytes)));
            },
            move |e| {
                let _ = err_tx.send((err_url, Err(e)));
            },
        );
    }
    drop(tx);

    let (mut fetched, mut failed) = (0usize, 0usize);
    while let Some((url, outcome)) = rx.recv().await {
        match outcome {
            Ok(bytes) => {
                fetched += 1;
                println!("{:>9}  {}", bytes.len(), url);
            }
            Err(e) => {
                failed += 1;
                warn!(url = %url, error = %e, "Thumbnail failed");
            }
        }
    }

    let cached = urls
        .iter()
        .filter(|url| service.cached_image(url).is_some())
        .count();
    let snapshot = service.metrics().snapshot();
    info!(
        fetched,
        failed,
        cached,
        cache_hits = snapshot.cache_hits,
        downloads = snapshot.downloads_completed,
        "Thumbnails done"
    );

    Ok(())
}
