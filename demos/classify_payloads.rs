//! Example classifying one payload of every supported kind
//!
//! Run with `cargo run --example classify_payloads`.

use emx_qrpayload::{classify, generator_link, Payload};

fn main() -> anyhow::Result<()> {
    println!("=== QR Payload Classification Example ===\n");

    let samples = [
        "https://example.com/docs?page=2#intro",
        "BEGIN:VCARD\nVERSION:3.0\nN:Doe;Jane\nTEL;TYPE=CELL:+15551234567\nEND:VCARD",
        "WIFI:T:WPA;S:HomeNet;P:hunter2;H:true;;",
        "tel:+15551234567",
        "SMSTO:+15551234567?body=On%20my%20way",
        "mailto:jane@example.com?subject=Hello&body=See+you+soon",
        "geo:48.8584,2.2945?q=Eiffel",
        r#"{"order":{"id":42,"items":["tea","cake"]}}"#,
        "just plain text",
    ];

    for (i, raw) in samples.iter().enumerate() {
        println!("{}. {:?}", i + 1, raw);
        match classify(raw) {
            Some(result) => {
                for (key, value) in result.iter() {
                    println!("     {}: {}", key, value);
                }
            }
            None => println!("     (unstructured)"),
        }
        println!("     -> {}", generator_link(raw));
    }

    // Typed access without going through the display fields
    if let Some(Payload::Wifi { ssid, hidden, .. }) = emx_qrpayload::parse(samples[2]) {
        println!("\nWiFi SSID {:?}, hidden: {}", ssid.unwrap_or_default(), hidden);
    }

    Ok(())
}
