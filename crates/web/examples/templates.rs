use gee_web::{Context, Engine};
use http::StatusCode;
use minijinja::Value;
use serde::Serialize;

#[derive(Serialize)]
struct Student {
    name: &'static str,
    age: u8,
}

const ARR_TEMPLATE: &str = r#"<html>
<body>
<p>hello, {{ title }}</p>
{% for student in students %}<p>{{ loop.index0 }}: {{ student.name }} is {{ student.age }} years old</p>
{% endfor %}<p>{{ shout(title) }}</p>
</body>
</html>
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = Engine::new();
    engine.add_template_function("shout", |args: &[Value]| {
        let text = args.first().and_then(Value::as_str).unwrap_or_default();
        Ok(Value::from(format!("{}!", text.to_uppercase())))
    });
    engine.add_template("arr.tmpl", ARR_TEMPLATE)?;

    // cargo run --example templates -- ./templates
    if let Some(dir) = std::env::args().nth(1) {
        engine.load_html_dir(dir)?;
    }

    // curl http://127.0.0.1:9999/students
    engine.get("/students", |c: &mut Context| {
        let students = vec![Student { name: "Geektutu", age: 20 }, Student { name: "Jack", age: 22 }];
        c.html(StatusCode::OK, "arr.tmpl", minijinja::context! { title => "gee", students => students });
    })?;

    engine.run("127.0.0.1:9999").await?;
    Ok(())
}
