//! Tienda POS cashier terminal.
//!
//! ## Usage
//! ```bash
//! TIENDA_DB_PATH=./tienda_dev.db cargo run -p tienda-terminal
//! ```
//! Type `help` at the prompt for the command list.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use tienda_core::{CustomerInput, Sale};
use tienda_db::{Database, DbConfig};
use tienda_terminal::commands::{self, cart::CartView, product::ProductDto, product::ProductForm};
use tienda_terminal::error::ApiError;
use tienda_terminal::receipt::render_receipt;
use tienda_terminal::state::{CartState, DbState, StoreConfig};

const HELP: &str = "\
Sales
  <barcode> | scan <barcode>   add one unit by barcode
  add <id>                     add one unit by product id
  qty <id> <n>                 set quantity (0 removes)
  cart                         show the cart
  cancel                       abandon the sale
  checkout                     take customer details and print the invoice
Lookup
  search <text>                quick search by name or barcode
  customer <doc id>            find a customer
  invoice <number>             reprint an invoice
  sale <id>                    reprint by sale id
  sales [n]                    latest sales
  today | summary [YYYY-MM-DD] sales count and takings
  lowstock                     products running out
Back office
  product <id|barcode>         show a product
  product new                  add a product
  product edit <id>            edit a product
  product stock <id> <delta>   restock (+) or remove (-) units
  customer new                 register a customer
  customer edit <id>           edit a customer
  help | quit";

struct Terminal {
    db: DbState,
    cart: CartState,
    config: StoreConfig,
    input: Lines<BufReader<Stdin>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = dotenvy::dotenv();
    tienda_terminal::init_tracing();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded .env");
    }

    let config = StoreConfig::from_env()?;
    info!(db_path = %config.db_path.display(), tax_rate = %config.tax_rate, "Starting Tienda POS terminal");

    let db = Database::new(DbConfig::new(&config.db_path)).await?;
    let cart = CartState::load(&config.cart_path)?;

    let mut terminal = Terminal {
        db: DbState::new(db),
        cart,
        config,
        input: BufReader::new(tokio::io::stdin()).lines(),
    };

    println!("{} - type `help` for commands", terminal.config.store_name);
    if !terminal.cart.with_cart(|c| c.is_empty()) {
        println!("Resuming open sale:");
        if let Err(e) = terminal.show_cart().await {
            println!("{}", e);
        }
    }

    loop {
        let Some(line) = terminal.prompt("> ").await? else {
            break;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        if matches!(words[0], "quit" | "exit") {
            break;
        }
        if let Err(e) = terminal.dispatch(&words).await {
            println!("{}", e);
        }
    }

    terminal.db.inner().close().await;
    info!("Terminal closed");
    Ok(())
}

impl Terminal {
    /// Prints `label` and reads one line. `None` at end of input.
    async fn prompt(&mut self, label: &str) -> std::io::Result<Option<String>> {
        print!("{}", label);
        std::io::stdout().flush()?;
        Ok(self.input.next_line().await?.map(|l| l.trim().to_string()))
    }

    /// Prompt with a default shown in brackets; blank keeps the default.
    async fn prompt_or(&mut self, label: &str, default: Option<&str>) -> Result<Option<String>, ApiError> {
        let shown = match default {
            Some(d) => format!("{} [{}]: ", label, d),
            None => format!("{}: ", label),
        };
        let answer = self
            .prompt(&shown)
            .await
            .map_err(|e| ApiError::internal(e.to_string()))?
            .unwrap_or_default();

        if answer.is_empty() {
            Ok(default.map(String::from))
        } else {
            Ok(Some(answer))
        }
    }

    async fn dispatch(&mut self, words: &[&str]) -> Result<(), ApiError> {
        let (db, cart, config) = (&self.db, &self.cart, &self.config);

        match words {
            ["help"] => println!("{}", HELP),
            [code] if code.chars().all(|c| c.is_ascii_digit()) => {
                let view = commands::cart::add_by_barcode(db, cart, config, code).await?;
                print_cart(&view);
            }
            ["scan", code] => {
                let view = commands::cart::add_by_barcode(db, cart, config, code).await?;
                print_cart(&view);
            }
            ["add", id] => {
                let view = commands::cart::add_by_id(db, cart, config, parse_int(id)?).await?;
                print_cart(&view);
            }
            ["qty", id, n] => {
                let view =
                    commands::cart::set_quantity(db, cart, config, parse_int(id)?, parse_int(n)?)
                        .await?;
                print_cart(&view);
            }
            ["cart"] => self.show_cart().await?,
            ["cancel"] | ["clear"] => {
                commands::cart::cancel_sale(cart)?;
                println!("Sale cancelled");
            }
            ["checkout"] => self.checkout().await?,
            ["search", rest @ ..] => {
                let products = commands::product::search_products(db, &rest.join(" ")).await?;
                print_products(&products);
            }
            ["customer", "new"] => {
                let input = self.customer_form(None).await?;
                let customer = commands::customer::create_customer(&self.db, input).await?;
                println!("Customer {} registered (id {})", customer.name, customer.id);
            }
            ["customer", "edit", id] => {
                let current = commands::customer::get_customer(db, parse_int(id)?).await?;
                let input = self.customer_form(Some(current.clone())).await?;
                let customer = commands::customer::update_customer(&self.db, current.id, input).await?;
                println!("Customer {} updated", customer.name);
            }
            ["customer", doc_id] => match commands::customer::lookup_customer(db, doc_id).await? {
                Some(c) => println!(
                    "#{} {} ({}) {} {} {}",
                    c.id,
                    c.name,
                    c.doc_id,
                    c.phone.unwrap_or_default(),
                    c.address.unwrap_or_default(),
                    c.email.unwrap_or_default()
                ),
                None => println!("No customer with document {}", doc_id),
            },
            ["invoice", number] => {
                let sale = commands::sale::get_invoice(db, number).await?;
                print!("{}", render_receipt(config, &sale, None));
            }
            ["sale", id] => {
                let sale = commands::sale::get_sale(db, parse_int(id)?).await?;
                print!("{}", render_receipt(config, &sale, None));
            }
            ["sales", rest @ ..] => {
                let limit = rest.first().map(|n| parse_int(n)).transpose()?;
                print_sales(&commands::sale::recent_sales(db, limit).await?);
            }
            ["today"] | ["summary"] => {
                let s = commands::sale::today_summary(db).await?;
                println!("{}: {} sales, {}", s.date, s.sale_count, s.total);
            }
            ["summary", date] => {
                let date = date
                    .parse()
                    .map_err(|_| ApiError::validation(format!("Not a date: {}", date)))?;
                let s = commands::sale::daily_summary(db, date).await?;
                println!("{}: {} sales, {}", s.date, s.sale_count, s.total);
            }
            ["lowstock"] => print_products(&commands::product::low_stock(db).await?),
            ["product", "new"] => {
                let form = self.product_form(None).await?;
                let product = commands::product::create_product(&self.db, form).await?;
                print_products(&[product]);
            }
            ["product", "edit", id] => {
                let current = commands::product::get_product(db, parse_int(id)?).await?;
                let form = self.product_form(Some(&current)).await?;
                let product = commands::product::update_product(&self.db, current.id, form).await?;
                print_products(&[product]);
            }
            ["product", "stock", id, delta] => {
                let product =
                    commands::product::adjust_stock(db, parse_int(id)?, parse_int(delta)?).await?;
                print_products(&[product]);
            }
            ["product", key] => {
                let product = match key.parse::<i64>() {
                    Ok(id) if key.len() < 8 => commands::product::get_product(db, id).await?,
                    _ => commands::product::get_product_by_barcode(db, key).await?,
                };
                print_products(&[product]);
            }
            _ => println!("Unknown command, type `help`"),
        }

        Ok(())
    }

    async fn show_cart(&self) -> Result<(), ApiError> {
        let view = commands::cart::get_cart(&self.db, &self.cart, &self.config).await?;
        print_cart(&view);
        Ok(())
    }

    async fn checkout(&mut self) -> Result<(), ApiError> {
        let view = commands::cart::get_cart(&self.db, &self.cart, &self.config).await?;
        print_cart(&view);

        let doc_id = self.prompt_or("Cedula/RUC (blank: consumidor final)", None).await?;
        let known = match &doc_id {
            Some(doc) => commands::customer::lookup_customer(&self.db, doc).await?,
            None => None,
        };
        if let Some(c) = &known {
            println!("Customer: {}", c.name);
        }

        let customer = match doc_id {
            Some(doc_id) => {
                let mut input = self.customer_details(known).await?;
                input.doc_id = Some(doc_id);
                input
            }
            None => CustomerInput::default(),
        };

        let payment = self
            .prompt_or("Payment method", Some(tienda_core::DEFAULT_PAYMENT_METHOD))
            .await?
            .unwrap_or_default();

        let sale =
            commands::sale::checkout(&self.db, &self.cart, &self.config, customer, &payment).await?;
        print!("{}", render_receipt(&self.config, &sale, Some(self.config.tax_rate)));
        Ok(())
    }

    async fn customer_form(
        &mut self,
        current: Option<tienda_core::Customer>,
    ) -> Result<CustomerInput, ApiError> {
        let doc_id = self
            .prompt_or("Cedula/RUC", current.as_ref().map(|c| c.doc_id.as_str()))
            .await?;
        let mut input = self.customer_details(current).await?;
        input.doc_id = doc_id;
        Ok(input)
    }

    /// Name, phone, address and email, defaulting to `current`.
    async fn customer_details(
        &mut self,
        current: Option<tienda_core::Customer>,
    ) -> Result<CustomerInput, ApiError> {
        let current = current.as_ref();
        Ok(CustomerInput {
            doc_id: None,
            name: self.prompt_or("Name", current.map(|c| c.name.as_str())).await?,
            phone: self.prompt_or("Phone", current.and_then(|c| c.phone.as_deref())).await?,
            address: self
                .prompt_or("Address", current.and_then(|c| c.address.as_deref()))
                .await?,
            email: self.prompt_or("Email", current.and_then(|c| c.email.as_deref())).await?,
        })
    }

    async fn product_form(&mut self, current: Option<&ProductDto>) -> Result<ProductForm, ApiError> {
        let price = current.map(|p| p.price.to_decimal().to_string());
        let stock = current.map(|p| p.stock.to_string());

        let barcode = self.prompt_or("Barcode", current.map(|p| p.barcode.as_str())).await?;
        let name = self.prompt_or("Name", current.map(|p| p.name.as_str())).await?;
        let price = self.prompt_or("Price", price.as_deref()).await?;
        let stock = self.prompt_or("Stock", stock.as_deref().or(Some("0"))).await?;

        Ok(ProductForm {
            barcode: barcode.unwrap_or_default(),
            name: name.unwrap_or_default(),
            price: price.unwrap_or_default(),
            stock: parse_int(stock.as_deref().unwrap_or("0"))?,
        })
    }
}

fn parse_int(text: &str) -> Result<i64, ApiError> {
    text.parse()
        .map_err(|_| ApiError::validation(format!("Not a number: {}", text)))
}

fn print_cart(view: &CartView) {
    if view.is_empty() {
        println!("Cart is empty");
        return;
    }
    for line in &view.lines {
        let short = if line.stock < line.quantity { "  (stock!)" } else { "" };
        println!(
            "#{:<5} {:<24} {:>4} x {:>8} = {:>9}{}",
            line.product_id,
            line.name,
            line.quantity,
            line.unit_price.to_string(),
            line.line_total.to_string(),
            short
        );
    }
    for id in &view.missing {
        warn!(product_id = id, "Cart line refers to a product that no longer exists");
    }
    println!("Subtotal {:>10}", view.subtotal.to_string());
    println!("IVA {:<5}{:>10}", view.tax_rate.to_string(), view.tax.to_string());
    println!("TOTAL    {:>10}   ({} items)", view.total.to_string(), view.item_count());
}

fn print_products(products: &[ProductDto]) {
    if products.is_empty() {
        println!("No products");
    }
    for p in products {
        println!(
            "#{:<5} {:<15} {:<24} {:>8}  stock {}{}",
            p.id,
            p.barcode,
            p.name,
            p.price.to_string(),
            p.stock,
            if p.low_stock { " (low)" } else { "" }
        );
    }
}

fn print_sales(sales: &[Sale]) {
    for s in sales {
        println!(
            "#{:<6} {}  {:<24} {:>9}  {}",
            s.id,
            s.created_at.format("%Y-%m-%d %H:%M"),
            s.customer_name.as_deref().unwrap_or("-"),
            s.total().to_string(),
            s.payment_method
        );
    }
}
