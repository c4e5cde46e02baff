use sovran_valuemap::TypedMap;
use std::sync::Arc;
use std::thread;

/// Middleware that stamps request metadata into the shared context
struct AuthLayer {
    context: Arc<TypedMap>,
}

impl AuthLayer {
    fn new(context: Arc<TypedMap>) -> Self {
        Self { context }
    }

    fn authenticate(&self, header: &str) {
        // Form fields and headers arrive as text
        let admin = header.ends_with(":admin");
        self.context.set("user", header.trim_end_matches(":admin"));
        self.context.set("is_admin", if admin { "true" } else { "false" });
        self.context.set_epoch_millis("authenticated_at", 1_700_000_000_000);
    }
}

/// Handler that only reads from the context
struct ReportHandler {
    context: Arc<TypedMap>,
}

impl ReportHandler {
    fn new(context: Arc<TypedMap>) -> Self {
        Self { context }
    }

    fn render(&self) -> String {
        format!(
            "user={} admin={} page={} since={}",
            self.context.get_string("user"),
            self.context.get_bool("is_admin"),
            self.context.get_i64("page").max(1),
            self.context.get_string("authenticated_at"),
        )
    }
}

/// Demonstrates a TypedMap shared between request-handling components
fn main() {
    let context = Arc::new(TypedMap::new());

    let auth = AuthLayer::new(Arc::clone(&context));
    let report = ReportHandler::new(Arc::clone(&context));

    auth.authenticate("alice:admin");
    context.set("page", "3");

    // Background workers annotate the same request
    let workers: Vec<_> = (0..3u32)
        .map(|worker| {
            let context = Arc::clone(&context);
            thread::spawn(move || {
                context.set(format!("worker_{}_ms", worker), 12.5 * f64::from(worker + 1));
            })
        })
        .collect();
    for worker in workers {
        if worker.join().is_err() {
            eprintln!("worker panicked");
        }
    }

    println!("{}", report.render());
    for worker in 0..3 {
        let key = format!("worker_{}_ms", worker);
        println!("{} = {}", key, context.get_string(&key));
    }

    // Missing values never fail, they read as defaults
    println!("retries = {}", context.get_i64("retries"));
    println!("{} entries in context", context.len());
}
