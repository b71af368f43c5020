//! Basic example of Sanad DI.

use std::sync::Arc;

use sanad::prelude::*;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

#[derive(Injectable)]
struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct Config {
    database_url: String,
    debug: bool,
}

#[derive(Injectable)]
struct Database {
    config: Arc<Config>,
    logger: Arc<dyn Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.config.database_url)
    }
}

#[derive(Injectable)]
struct UserService {
    db: Arc<Database>,
    #[inject(named = "greeting")]
    greeting: Arc<String>,
    #[inject(member, optional)]
    audit: Option<Arc<dyn Logger>>,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        if let Some(audit) = &self.audit {
            audit.log(&format!("Audit: user {id} requested"));
        }
        let rows = self.db.query(&format!("SELECT * FROM users WHERE id = {id}"));
        format!("{} {rows}", self.greeting)
    }
}

// === Modules ===

struct InfrastructureModule;

impl Module for InfrastructureModule {
    fn configure(&self, binder: &mut Binder) {
        binder.bind::<Config>().to_instance(Arc::new(Config {
            database_url: "postgres://localhost/myapp".to_string(),
            debug: true,
        }));
        binder.bind::<dyn Logger>().singleton().to::<ConsoleLogger>(|l| l);
        binder.bind::<Database>().singleton().to_self();
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("sanad_container=debug,greeter=info")
        .init();

    let injector = Injector::builder()
        .install(InfrastructureModule)
        .install(from_fn(|binder| {
            binder
                .bind::<String>()
                .named("greeting")
                .to_instance(Arc::new("Hello!".into()));
        }))
        .build()?;

    tracing::info!(bindings = injector.get_bindings().len(), "Demo injector ready");
    println!("✅ Injector built successfully!");
    println!("{injector:?}");

    let config = injector.resolve::<Config>()?;
    println!("📋 Config: database_url={}, debug={}", config.database_url, config.debug);

    // UserService is not bound: it is built from its derived constructor
    let service = injector.resolve::<UserService>()?;
    println!("👤 {}", service.get_user(42));

    // === A child injector for one request ===
    {
        let request = injector.create_child_injector(&[&from_fn(|binder| {
            binder
                .bind::<String>()
                .named("greeting")
                .to_instance(Arc::new("Welcome back!".into()));
        })])?;

        let service = request.resolve::<UserService>()?;
        println!("👤 {}", service.get_user(7));

        // Database is a parent singleton, shared with the child
        let shared = Arc::ptr_eq(
            &request.resolve::<Database>()?,
            &injector.resolve::<Database>()?,
        );
        println!("🔗 Database shared with parent: {shared}");
    }

    // === Lazy access through a provider ===
    if let Some(provider) = injector.get_provider::<dyn Logger>() {
        if let Some(logger) = provider.get()? {
            logger.log("resolved lazily");
        }
    }

    for binding in injector.get_bindings() {
        let info = binding.info();
        println!("📦 {} ({}, {:?})", info.key, info.scope, info.injection);
    }

    println!("\n🎉 Everything works!");
    Ok(())
}
