use anyhow::Result;

pub async fn run(account: &str) -> Result<()> {
    println!("Authorizing Google account {}...", account);

    calsync_provider_google::authenticate(account).await?;

    println!("\nAuthenticated as: {}", account);
    println!("\nUse it in your config.toml, as a source or as the target:");
    println!();
    println!("[target]");
    println!("kind = \"google\"");
    println!("label = \"mirror\"");
    println!("account = \"{}\"", account);
    println!("calendar_id = \"primary\"");
    println!();
    println!("Then run `calsync status` to preview the first sync.");

    Ok(())
}
