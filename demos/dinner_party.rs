//! Dinner party example.
//!
//! Three friends each owe the next one a favor. The third IOU closes the
//! loop and party detection reports everyone involved.

use iou_party::prelude::*;
use uuid::Uuid;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("╔═══════════════════════════════════════╗");
    println!("║  iou-party: Dinner Party Detection    ║");
    println!("╚═══════════════════════════════════════╝\n");

    let book = IouBook::new(InMemoryIouStore::new());
    let alice = UserId::new("alice");
    let bob = UserId::new("bob");
    let carol = UserId::new("carol");
    let coffee = Uuid::new_v4();

    println!("IOUs:");
    println!("  alice owes bob   a coffee");
    println!("  bob   owes carol a coffee");
    println!("  carol owes alice a coffee\n");

    book.create_owed(alice.clone(), bob.clone(), coffee, "receipt-ab")?;
    book.create_owe(bob.clone(), Some(carol.clone()), coffee)?;
    let created = book.create_owed(carol.clone(), alice.clone(), coffee, "receipt-ca")?;

    println!("━━━ Party Detection ━━━\n");
    match &created.party {
        Some(party) => {
            let members: Vec<String> = party.members().iter().map(|m| m.to_string()).collect();
            println!("  Party! {}", members.join(" → "));
            println!("  Closed by: {}", party.closing());
        }
        None => println!("  No party detected."),
    }

    println!("\n━━━ Settling ━━━\n");
    let unsettled = book.list(&IouFilter::unsettled())?;
    for iou in unsettled.iter().filter(|iou| iou.giver() == &bob) {
        book.complete_owe(iou.id(), &bob, "photo-of-coffee")?;
        println!("  bob settled IOU {}", iou.id());
    }

    let graph = book.detector().snapshot()?;
    println!(
        "  Remaining debt graph: {} users, {} edges, acyclic: {}",
        graph.user_count(),
        graph.edge_count(),
        graph.is_acyclic()
    );
    Ok(())
}
