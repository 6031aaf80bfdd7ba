//! Index page.
//!
//! A fixed page with one button per configured backend. Buttons of busy
//! backends are rendered disabled.

use crate::config::BackendKind;

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html>
	<head>
		<link rel="stylesheet" href="//maxcdn.bootstrapcdn.com/bootstrap/3.3.7/css/bootstrap.min.css" crossorigin="anonymous">
		<title>Datastore Exerciser</title>
	</head>
	<body>
		<nav class="navbar navbar-default">
			<div class="container-fluid">
				<div class="navbar-header">
					<span class="navbar-brand">Datastore Load Demo</span>
				</div>
			</div>
		</nav>

		<div class="container">
"#;

const PAGE_TAIL: &str = r#"		</div>
	</body>
</html>
"#;

fn button_style(kind: BackendKind) -> &'static str {
    match kind {
        BackendKind::Mysql => "btn-primary",
        BackendKind::Pgsql => "btn-success",
        BackendKind::Redis => "btn-danger",
        BackendKind::Memcache => "btn-info",
        BackendKind::Mongodb => "btn-warning",
        BackendKind::Cassandra | BackendKind::Rabbitmq => "btn-default",
    }
}

/// Render the index page for `kinds`, disabling those in `busy`.
pub fn render_index(kinds: &[BackendKind], busy: &[BackendKind]) -> String {
    let mut page = String::from(PAGE_HEAD);
    for kind in kinds {
        let disabled = if busy.contains(kind) { " disabled" } else { "" };
        page.push_str(&format!(
            "\t\t\t<a class=\"btn {}{}\" href=\"/{}\">{}</a>\n",
            button_style(*kind),
            disabled,
            kind.as_str(),
            kind.label()
        ));
    }
    page.push_str(PAGE_TAIL);
    page
}
