//! Signature and stamp retrieval for the prescription footer.
//!
//! Fetch failures never fail the document: the slot degrades to a text
//! label and the cause is logged.

use crate::models::PrescriptionRecord;

pub const SIGNATURE_FALLBACK: &str = "Firma no disponible";
pub const STAMP_FALLBACK: &str = "Sello no disponible";

/// What ends up in a footer slot: raw image bytes, or the label drawn in
/// their place.
#[derive(Debug, Clone)]
pub enum SlotContent {
    Image(Vec<u8>),
    Fallback(&'static str),
}

#[derive(Debug, Clone)]
pub struct SlotImages {
    pub signature: SlotContent,
    pub stamp: SlotContent,
}

/// Single GET, no retry. Any transport error or non-2xx status degrades
/// to the fallback label.
pub async fn fetch_slot(
    client: &reqwest::Client,
    url: Option<&str>,
    fallback: &'static str,
) -> SlotContent {
    let Some(url) = url else {
        return SlotContent::Fallback(fallback);
    };

    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(url, error = %e, "image fetch failed");
            return SlotContent::Fallback(fallback);
        }
    };
    if !response.status().is_success() {
        tracing::warn!(url, status = %response.status(), "image fetch returned error status");
        return SlotContent::Fallback(fallback);
    }
    match response.bytes().await {
        Ok(bytes) => SlotContent::Image(bytes.to_vec()),
        Err(e) => {
            tracing::warn!(url, error = %e, "image body read failed");
            SlotContent::Fallback(fallback)
        }
    }
}

pub async fn fetch_prescription_images(
    client: &reqwest::Client,
    record: &PrescriptionRecord,
) -> SlotImages {
    SlotImages {
        signature: fetch_slot(client, record.signature_url.as_deref(), SIGNATURE_FALLBACK).await,
        stamp: fetch_slot(client, record.stamp_url.as_deref(), STAMP_FALLBACK).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_url_falls_back() {
        let client = reqwest::Client::new();
        let slot = fetch_slot(&client, None, SIGNATURE_FALLBACK).await;
        assert!(matches!(slot, SlotContent::Fallback(SIGNATURE_FALLBACK)));
    }

    #[tokio::test]
    async fn unreachable_host_falls_back() {
        let client = reqwest::Client::new();
        // Port 9 on localhost is not listening.
        let slot = fetch_slot(&client, Some("http://127.0.0.1:9/firma.png"), STAMP_FALLBACK).await;
        assert!(matches!(slot, SlotContent::Fallback(STAMP_FALLBACK)));
    }

    #[tokio::test]
    async fn error_status_falls_back() {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let _ = stream
                    .write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n")
                    .await;
            }
        });

        let client = reqwest::Client::new();
        let url = format!("http://{addr}/sello.png");
        let slot = fetch_slot(&client, Some(&url), STAMP_FALLBACK).await;
        assert!(matches!(slot, SlotContent::Fallback(STAMP_FALLBACK)));
    }
}
