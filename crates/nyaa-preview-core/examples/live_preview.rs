//! Hover listing titles against the live catalog sites.
//!
//! ```text
//! RUST_LOG=nyaa_preview_core=debug cargo run --example live_preview -- " FC2-PPV-4012345 " " SSIS-001 "
//! ```

use nyaa_preview_core::{
    AuxClick, HoverController, HoveredRow, Point, PopoverContent, PreviewConfig, RowLink,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let controller = HoverController::new(&PreviewConfig::default())?;

    let mut titles: Vec<String> = std::env::args().skip(1).collect();
    if titles.is_empty() {
        titles = vec![
            " FC2-PPV-4012345 ".to_string(),
            "[FHD] SSIS-001 ".to_string(),
            "Untagged upload".to_string(),
        ];
    }

    for (i, title) in titles.iter().enumerate() {
        println!("\n{}", "=".repeat(60));
        println!("Hovering: {:?}", title);
        println!("{}\n", "=".repeat(60));

        let row = HoveredRow::new(vec![
            RowLink {
                href: format!("https://sukebei.nyaa.si/view/{}", i + 1),
                text: title.clone(),
            },
            RowLink {
                href: format!("magnet:?xt=urn:btih:{:040}", i + 1),
                text: String::new(),
            },
        ]);

        let Some(view) = controller.on_row_hover(&row, Point::new(0.0, 0.0)).await else {
            println!("No catalog pattern matched");
            continue;
        };

        println!("Source: {}", view.source);
        match &view.content {
            PopoverContent::Preview {
                image_url,
                tags,
                link,
            } => {
                println!("Image: {}", image_url);
                println!("Tags:  {}", tags);
                println!("Link:  {}", link);
            }
            PopoverContent::NotFound { message } => println!("{}", message),
            PopoverContent::Loading => println!("Still loading"),
        }

        let click = controller.on_aux_click(AuxClick {
            button: AuxClick::MIDDLE_BUTTON,
            modifier: false,
        });
        println!("Middle-click: {:?}", click);

        controller.on_anchor_leave();
    }

    Ok(())
}
