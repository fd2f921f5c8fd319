use maud::{html, Markup, DOCTYPE};

pub fn desktop_layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style {
                    "body { font-family: system-ui, sans-serif; margin: 0; color: #111827; }"
                    "main { max-width: 960px; margin: 0 auto; padding: 1.5rem; }"
                    ".card { border: 1px solid #e5e7eb; border-radius: 8px; padding: 1rem; }"
                }
            }
            body {
                header style="display: flex; align-items: center; justify-content: space-between; padding: 12px 24px; box-shadow: 0 1px 3px rgba(0,0,0,0.1);" {
                    h3 style="margin: 0;" { "Event Listings" }
                    nav {
                        a href="/admin" { "Admin" }
                    }
                }
                (content)
            }
        }
    }
}
