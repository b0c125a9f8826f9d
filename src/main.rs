use anyhow::Context;
use clap::Parser;
use storefront_cart::config::Command;
use storefront_cart::domain::ports::{CartService, KeyValueStore};
use storefront_cart::utils::error::ErrorCategory;
use storefront_cart::utils::{logger, validation::Validate};
use storefront_cart::{
    CartError, CliConfig, FocusTarget, HttpCartService, LocalStorage, ProductForm,
    RemovalOutcome, Storefront, SubmitOutcome,
};

const FORM_ID: &str = "product-form";
const QUANTITY_ID: &str = "product-quantity";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.load_storefront_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    tracing::info!("🛒 Storefront: {}", config.base_url());
    let service = HttpCartService::new(&config)?;
    let storage = LocalStorage::new(&cli.state_file);
    let shop = Storefront::new(service, storage, config);

    if let Err(e) = run(&shop, cli.command).await {
        match e.downcast_ref::<CartError>() {
            Some(cart_error) => {
                tracing::error!(
                    "❌ {} (category: {:?})",
                    cart_error,
                    cart_error.category()
                );
                eprintln!("❌ {}", cart_error.user_friendly_message());
                eprintln!("💡 {}", cart_error.recovery_suggestion());
                let exit_code = match cart_error.category() {
                    ErrorCategory::Network | ErrorCategory::Response => 2,
                    ErrorCategory::Configuration | ErrorCategory::Input => 1,
                    ErrorCategory::Storage => 3,
                };
                std::process::exit(exit_code);
            }
            None => return Err(e),
        }
    }

    Ok(())
}

async fn run<C: CartService, K: KeyValueStore>(
    shop: &Storefront<C, K>,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Count => {
            let cart = shop.refresh_cart_count().await?;
            let badge = shop.view().read(|s| s.cart_badge.clone());
            if badge.visible {
                println!("🛒 {} item(s) in cart", badge.count);
            } else {
                println!("🛒 Cart is empty");
            }
            if let Some(total) = cart.total_price {
                println!("Subtotal: {}", shop.format_money(total));
            }
        }
        Command::Add {
            variant,
            quantity,
            buy_now,
        } => {
            shop.register_product_form(FORM_ID, "Add to cart");
            let quantity = shop.register_quantity_selector(QUANTITY_ID, &quantity, None, None);
            let form = ProductForm::for_variant(variant, quantity);
            let focus = if buy_now {
                FocusTarget::BuyNow
            } else {
                FocusTarget::AddToCart
            };

            match shop.submit_product_form(FORM_ID, &form, focus).await? {
                SubmitOutcome::Added(item) => {
                    let label = shop
                        .view()
                        .read(|s| s.submit_control(FORM_ID).map(|c| c.label().to_string()))
                        .unwrap_or_default();
                    println!("{} {} x{}", label, item.title, quantity);
                    let badge = shop.view().read(|s| s.cart_badge.clone());
                    if badge.visible {
                        println!("🛒 {} item(s) in cart", badge.count);
                    }
                }
                SubmitOutcome::DefaultSubmission => {
                    println!(
                        "➡️  Continue to checkout: {}/cart/{}:{}",
                        shop.config().base_url().trim_end_matches('/'),
                        variant,
                        quantity
                    );
                }
                SubmitOutcome::NotEngaged | SubmitOutcome::Ignored => {
                    println!("Nothing submitted");
                }
            }
        }
        Command::Remove { line } => {
            shop.register_cart_line(&line, "");
            match shop.remove_line(&line).await? {
                RemovalOutcome::CartEmptied => println!("🛒 Cart is now empty"),
                RemovalOutcome::LineRemoved(cart) => {
                    println!("Removed line {}", line);
                    if let Some(subtotal) = shop.view().read(|s| s.subtotal.clone()) {
                        println!("Subtotal: {}", subtotal);
                    }
                    println!("🛒 {} item(s) in cart", cart.item_count);
                }
                RemovalOutcome::Ignored => println!("Line {} is already being removed", line),
            }
        }
        Command::QuickView { product_url } => {
            let content = shop.open_quick_view(&product_url).await?;
            println!("{}", content.title);
            println!("Price: {}", content.price);
            if let Some(image) = content.image_src {
                println!("Image: {}", image);
            }
            println!("Full details: {}", content.link);
        }
        Command::Track {
            product_json,
            page_path,
        } => {
            let json = tokio::fs::read_to_string(&product_json)
                .await
                .with_context(|| format!("reading product JSON from {}", product_json))?;
            match shop.track_product_view(&json, &page_path).await? {
                Some(entry) => println!("👀 Tracked {} ({})", entry.title, entry.price),
                None => println!("Product has no id, nothing tracked"),
            }
        }
        Command::Recent => {
            let products = shop.recently_viewed().await?;
            if products.is_empty() {
                println!("No recently viewed products");
            }
            for (i, product) in products.iter().enumerate() {
                println!("{:>2}. {} {} {}", i + 1, product.title, product.price, product.url);
            }
        }
        Command::Format { minor_units } => {
            println!("{}", shop.format_money(minor_units));
        }
    }

    Ok(())
}
