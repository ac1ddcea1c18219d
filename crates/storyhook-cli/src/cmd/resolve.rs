use anyhow::{anyhow, Result};
use storyhook_core::reference::StoryResolver;

pub fn run(story_repo: &str, api_base: &str, json: bool) -> Result<()> {
    let body = super::read_stdin()?;
    let story = StoryResolver::new(story_repo)
        .resolve(&body)
        .ok_or_else(|| anyhow!("no reference to {story_repo} found"))?;

    let url = story.api_url(api_base);
    if json {
        let out = serde_json::json!({
            "repo": story.repo,
            "number": story.number,
            "url": url,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{url}");
    }
    Ok(())
}
