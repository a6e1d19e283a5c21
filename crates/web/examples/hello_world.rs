use gee_web::{Context, Engine};
use http::StatusCode;

fn index(c: &mut Context) {
    c.string(StatusCode::OK, "hello world\n");
}

// curl "http://127.0.0.1:9999/hello?name=geektutu"
fn hello(c: &mut Context) {
    let name = c.query("name").unwrap_or_else(|| "guest".to_string());
    c.string(StatusCode::OK, format!("hello {name}, you're at {}\n", c.path()));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = Engine::new();
    engine.get("/", index)?.get("/hello", hello)?;

    engine.run("127.0.0.1:9999").await?;
    Ok(())
}
