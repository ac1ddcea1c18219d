use anyhow::Result;
use std::io::Write;
use storyhook_core::checklist;

pub fn run(owner: &str, repo: &str, number: u64, json: bool) -> Result<()> {
    let body = super::read_stdin()?;
    let ticked = checklist::tick(&body, owner, repo, number);

    if json {
        let out = serde_json::json!({
            "body": ticked.body,
            "lines": ticked.lines,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        // Body goes out byte-for-byte; the count goes to stderr.
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(ticked.body.as_bytes())?;
        stdout.flush()?;
        eprintln!(
            "ticked {} line{} for {owner}/{repo}#{number}",
            ticked.lines,
            if ticked.lines == 1 { "" } else { "s" }
        );
    }
    Ok(())
}
