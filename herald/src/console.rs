//! Interactive console on stdin

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use herald_core::SubscriberSession;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

const MENU: &str = "
Subscriber Menu:
1] Get available topics
2] Subscribe to a topic
3] Unsubscribe from a topic
4] Show my subscriptions
5] Exit";

fn prompt(text: &str) -> Result<()> {
    print!("{text}");
    std::io::stdout().flush()?;
    Ok(())
}

async fn read_topic(lines: &mut Lines<BufReader<Stdin>>, text: &str) -> Result<Option<String>> {
    prompt(text)?;
    Ok(lines.next_line().await?.map(|l| l.trim().to_string()))
}

/// Run the menu loop until the user exits or stdin closes
pub async fn run(session: Arc<SubscriberSession>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let subs = session.subscriptions();

    loop {
        println!("{MENU}");
        prompt("Enter your choice: ")?;

        let Some(choice) = lines.next_line().await? else {
            return Ok(());
        };

        match choice.trim() {
            "1" => {
                let topics = subs.available_topics().await;
                if topics.is_empty() {
                    println!("No topics available.");
                } else {
                    println!("Available topics: {}", topics.join(", "));
                }
            }
            "2" => {
                let prompt_text = "Enter topic to subscribe: ";
                let Some(topic) = read_topic(&mut lines, prompt_text).await? else {
                    return Ok(());
                };
                match subs.subscribe(&topic).await {
                    Ok(()) => println!("Subscribed to: {topic}"),
                    Err(e) => println!("Subscribe failed: {e}"),
                }
            }
            "3" => {
                let prompt_text = "Enter topic to unsubscribe: ";
                let Some(topic) = read_topic(&mut lines, prompt_text).await? else {
                    return Ok(());
                };
                match subs.unsubscribe(&topic).await {
                    Ok(()) => println!("Unsubscribed from: {topic}"),
                    Err(e) => println!("Unsubscribe failed: {e}"),
                }
            }
            "4" => {
                let topics = subs.subscribed_topics();
                if topics.is_empty() {
                    println!("Not subscribed to any topic.");
                } else {
                    println!("Subscribed topics: {}", topics.join(", "));
                }
            }
            "5" => {
                println!("Exiting console, subscriber keeps running.");
                return Ok(());
            }
            _ => println!("Invalid choice. Please try again."),
        }
    }
}
