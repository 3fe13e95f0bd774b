use colored::Colorize;
use fwumd::api::{CmdMessage, CmdResult, DumpView, MessageLevel, UuidReport};
use fwumd::binary::FieldValue;
use fwumd::layout::Field;
use std::fmt::Write;

const NAME_WIDTH: usize = 28;

pub(super) fn print_result(result: &CmdResult) {
    if let Some(dump) = &result.dump {
        print!("{}", render_dump(dump));
    }
    if let Some(uuids) = &result.uuids {
        print!("{}", render_uuids(uuids));
    }
    print_messages(&result.messages);
}

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

pub(super) fn render_dump(dump: &DumpView) -> String {
    let mut out = String::new();
    if dump.text.is_some() {
        let _ = writeln!(out, "{}", "--- BINARY ---".bold());
    }
    for field in &dump.fields {
        let _ = writeln!(out, "{}", render_field(field));
    }
    if let Some(text) = &dump.text {
        let _ = writeln!(out, "{}", "--- JSON ---".bold());
        let _ = writeln!(out, "{}", text);
    }
    out
}

fn render_field(field: &FieldValue) -> String {
    let name = field.span.field.to_string();
    let value = match field.span.field {
        Field::Checksum => format!("{:#010x}", field.value),
        Field::Accepted { .. } if field.value == 0 => format!("{} (refused)", field.value),
        Field::Accepted { .. } => format!("{} (accepted)", field.value),
        _ => field.value.to_string(),
    };
    format!(
        "{:>4}  {:<width$}{}",
        field.span.offset,
        name,
        value,
        width = NAME_WIDTH
    )
}

pub(super) fn render_uuids(report: &UuidReport) -> String {
    let mut out = String::new();
    match report {
        UuidReport::All { locations, images } => {
            let _ = writeln!(out, "{}", "--- Locations ---".bold());
            for (name, uuid) in locations {
                let _ = writeln!(out, "{}: {}", name, uuid);
            }
            let _ = writeln!(out, "\n{}", "--- Image types ---".bold());
            for image in images {
                match image.uuid {
                    Some(uuid) => {
                        let _ = writeln!(out, "{}: {}", image.image, uuid);
                    }
                    None => {
                        let _ = writeln!(out, "{}: -", image.image);
                    }
                }
            }
            let _ = writeln!(out, "\n{}", "--- Image banks ---".bold());
            for image in images {
                let _ = writeln!(out, " - {} banks", image.image);
                for (name, uuid) in &image.banks {
                    let _ = writeln!(out, "\t{}: {}", name, uuid);
                }
                out.push('\n');
            }
        }
        UuidReport::Choices {
            active_index,
            choices,
            will_boot,
        } => {
            let _ = writeln!(out, "Banks {} selected", active_index);
            for choice in choices {
                let uuid = choice
                    .uuid
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let policy = if choice.accepted {
                    "accepted".green()
                } else {
                    "refused".red()
                };
                let _ = writeln!(out, "{}: {} ({})", choice.image, uuid, policy);
            }
            if !will_boot {
                let _ = writeln!(out, "\n{}", "/!\\ This setup will not be booted".yellow());
                let _ = writeln!(out, "    Verify that all the banks are accepted\n");
            }
        }
    }
    out
}
