use fitalloc::{Allocator, SearchMode};

/// Prints the pool partition, one block per cell, in address order.
fn print_blocks(
  label: &str,
  allocator: &Allocator,
) {
  let cells: Vec<String> = allocator.blocks().map(|block| block.to_string()).collect();
  println!(
    "[{label}] {} blocks: {}",
    allocator.block_count(),
    cells.join(" ")
  );
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  for mode in SearchMode::ALL {
    println!("\n=== {mode} ===");

    let mut allocator = Allocator::new();
    if let Err(e) = allocator.init(116, mode) {
      eprintln!("init failed: {e}");
      return;
    }
    print_blocks("init", &allocator);

    // --------------------------------------------------------------------
    // 1) Carve a fragmented layout: holes of 20, 52 and 32 bytes separated
    //    by small allocations.
    // --------------------------------------------------------------------
    let handles: Vec<_> = [20, 4, 52, 4, 32, 4]
      .into_iter()
      .map(|size| allocator.allocate(size))
      .collect();
    for i in [0, 2, 4] {
      allocator.free(handles[i]);
    }
    print_blocks("fragmented", &allocator);

    // --------------------------------------------------------------------
    // 2) Request 25 bytes (28 once aligned). Each mode picks a different
    //    hole: first-fit the lowest that fits, best-fit the tightest,
    //    worst-fit the largest.
    // --------------------------------------------------------------------
    let placed = allocator.allocate(25);
    match placed {
      Some(handle) => println!("[request 25] placed at offset {}", handle.offset()),
      None => println!("[request 25] no suitable hole"),
    }
    print_blocks("after request", &allocator);

    // --------------------------------------------------------------------
    // 3) Write through the handle and read it back.
    // --------------------------------------------------------------------
    if let Some(region) = placed.and_then(|handle| allocator.get_mut(handle)) {
      region[..6].copy_from_slice(b"Hello\n");
    }
    if let Some(region) = placed.and_then(|handle| allocator.get(handle)) {
      print!("[write] {}", String::from_utf8_lossy(&region[..6]));
    }

    // --------------------------------------------------------------------
    // 4) Free it again: the block merges back into its neighbours.
    // --------------------------------------------------------------------
    allocator.free(placed);
    print_blocks("freed", &allocator);

    // --------------------------------------------------------------------
    // 5) Free a handle the allocator never gave out. Nothing happens.
    // --------------------------------------------------------------------
    allocator.free(Some(fitalloc::Handle::from_offset(3)));
    print_blocks("foreign free", &allocator);

    println!("{}", allocator.stats().summary());
    let fragmentation = allocator.fragmentation();
    println!(
      "{} holes, largest {} of {} free bytes, fragmentation {:.0}%",
      fragmentation.holes,
      fragmentation.largest_hole,
      fragmentation.free_bytes,
      fragmentation.ratio() * 100.0,
    );

    allocator.destroy();
  }
}
