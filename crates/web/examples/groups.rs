use gee_web::middleware::{Logger, Recovery};
use gee_web::{Context, Engine, Server, ServerConfig};
use http::StatusCode;
use serde::Serialize;

#[derive(Serialize)]
struct Login {
    username: String,
}

// only lets requests carrying `?token=gee` through
fn token_guard(c: &mut Context) {
    if c.query("token").as_deref() != Some("gee") {
        c.fail(StatusCode::UNAUTHORIZED, "missing or wrong token");
        return;
    }
    c.next();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = Engine::new();
    engine.use_middleware(Recovery).use_middleware(Logger);

    // curl http://127.0.0.1:9999/panic
    engine.get("/panic", |c: &mut Context| {
        let names = ["geektutu"];
        let index = c.path().len();
        c.string(StatusCode::OK, names[index]);
    })?;

    {
        let mut v1 = engine.group("/v1");
        // curl http://127.0.0.1:9999/v1/hello/geektutu
        v1.get("/hello/:name", |c: &mut Context| {
            let body = format!("hello {}, you're at {}\n", c.param("name").unwrap_or_default(), c.path());
            c.string(StatusCode::OK, body);
        })?;
        // curl http://127.0.0.1:9999/v1/assets/css/geektutu.css
        v1.get("/assets/*filepath", |c: &mut Context| {
            let filepath = c.param("filepath").unwrap_or_default().to_string();
            c.json(StatusCode::OK, &serde_json::json!({ "filepath": filepath }));
        })?;
    }

    {
        let mut admin = engine.group("/admin");
        admin.use_middleware(token_guard);
        // curl -d "username=geektutu" "http://127.0.0.1:9999/admin/login?token=gee"
        admin.post("/login", |c: &mut Context| {
            let login = Login { username: c.post_form("username").unwrap_or_default() };
            c.json(StatusCode::OK, &login);
        })?;
    }

    let config = ServerConfig { log_level: "debug".to_string(), ..ServerConfig::default() };
    Server::builder().engine(engine).config(&config).build()?.start().await?;
    Ok(())
}
