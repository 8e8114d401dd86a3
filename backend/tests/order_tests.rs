//! Order lifecycle and inventory reconciliation tests
//!
//! Pure-logic simulations of the order engine's rules:
//! - stock is never driven below zero
//! - persisted totals always reconcile with the line set
//! - deleting an order restores stock exactly
//! - replacing a pending order's items nets out like delete-then-create
//! - item replacement is rejected for non-pending orders

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;

use shared::models::OrderStatus;

// ============================================================================
// Simulation of the engine's transactional rules
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct SimProduct {
    price: Decimal,
    stock: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SimLine {
    product: u32,
    quantity: i32,
    price_each: Decimal,
}

#[derive(Debug, Clone)]
struct SimOrder {
    status: OrderStatus,
    lines: Vec<SimLine>,
    total_amount: Decimal,
    profit: Decimal,
}

type Inventory = HashMap<u32, SimProduct>;

/// Merge duplicate product lines: quantities sum, the last price wins
fn merge_lines(lines: &[SimLine]) -> Vec<SimLine> {
    let mut merged: Vec<SimLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some(existing) = merged.iter_mut().find(|m| m.product == line.product) {
            existing.quantity += line.quantity;
            existing.price_each = line.price_each;
        } else {
            merged.push(*line);
        }
    }
    merged
}

fn totals(lines: &[SimLine], inventory: &Inventory) -> (Decimal, Decimal) {
    let mut total = Decimal::ZERO;
    let mut profit = Decimal::ZERO;
    for line in lines {
        let cost = inventory[&line.product].price;
        let quantity = Decimal::from(line.quantity);
        total += line.price_each * quantity;
        profit += (line.price_each - cost) * quantity;
    }
    (total, profit)
}

/// Create an order; on any failure the inventory is left untouched
fn create_order(
    inventory: &mut Inventory,
    lines: &[SimLine],
    status: OrderStatus,
) -> Result<SimOrder, &'static str> {
    let merged = merge_lines(lines);
    if merged.is_empty() {
        return Err("order items are required");
    }
    for line in &merged {
        if line.quantity <= 0 {
            return Err("quantity must be positive");
        }
        let product = inventory.get(&line.product).ok_or("product not found")?;
        if line.quantity > product.stock {
            return Err("insufficient stock");
        }
    }

    let (total_amount, profit) = totals(&merged, inventory);
    for line in &merged {
        inventory.get_mut(&line.product).unwrap().stock -= line.quantity;
    }

    Ok(SimOrder {
        status,
        lines: merged,
        total_amount,
        profit,
    })
}

/// Replace a pending order's item set; failures leave order and stock as-is
fn edit_order_items(
    inventory: &mut Inventory,
    order: &mut SimOrder,
    new_lines: &[SimLine],
) -> Result<(), &'static str> {
    if order.status != OrderStatus::Pending {
        return Err("editing items is only allowed for pending orders");
    }

    // Work on a scratch copy so a failed replacement rolls everything back
    let mut scratch = inventory.clone();
    for line in &order.lines {
        scratch.get_mut(&line.product).unwrap().stock += line.quantity;
    }

    let merged = merge_lines(new_lines);
    if merged.is_empty() {
        return Err("order items are required");
    }
    for line in &merged {
        if line.quantity <= 0 {
            return Err("quantity must be positive");
        }
        let product = scratch.get(&line.product).ok_or("product not found")?;
        if line.quantity > product.stock {
            return Err("insufficient stock");
        }
    }

    let (total_amount, profit) = totals(&merged, &scratch);
    for line in &merged {
        scratch.get_mut(&line.product).unwrap().stock -= line.quantity;
    }

    *inventory = scratch;
    order.lines = merged;
    order.total_amount = total_amount;
    order.profit = profit;
    Ok(())
}

/// Delete an order, restoring stock for every line
fn delete_order(inventory: &mut Inventory, order: SimOrder) {
    for line in &order.lines {
        inventory.get_mut(&line.product).unwrap().stock += line.quantity;
    }
}

fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

fn line(product: u32, quantity: i32, price_each: i64) -> SimLine {
    SimLine {
        product,
        quantity,
        price_each: dec(price_each),
    }
}

fn inventory_of(products: &[(u32, i64, i32)]) -> Inventory {
    products
        .iter()
        .map(|&(id, price, stock)| {
            (
                id,
                SimProduct {
                    price: dec(price),
                    stock,
                },
            )
        })
        .collect()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Worked lifecycle: create, replace items, delete
    #[test]
    fn test_order_lifecycle_reconciles_stock_and_totals() {
        let mut inventory = inventory_of(&[(1, 100, 10)]);

        // Create: 3 units at 120 each
        let mut order =
            create_order(&mut inventory, &[line(1, 3, 120)], OrderStatus::Pending).unwrap();
        assert_eq!(inventory[&1].stock, 7);
        assert_eq!(order.total_amount, dec(360));
        assert_eq!(order.profit, dec(60));

        // Replace items: 5 units at 110 each
        edit_order_items(&mut inventory, &mut order, &[line(1, 5, 110)]).unwrap();
        assert_eq!(inventory[&1].stock, 5);
        assert_eq!(order.total_amount, dec(550));
        assert_eq!(order.profit, dec(50));

        // Delete restores everything
        delete_order(&mut inventory, order);
        assert_eq!(inventory[&1].stock, 10);
    }

    #[test]
    fn test_insufficient_stock_rejects_and_preserves_inventory() {
        let mut inventory = inventory_of(&[(1, 100, 2)]);
        let result = create_order(&mut inventory, &[line(1, 5, 120)], OrderStatus::Pending);
        assert_eq!(result.unwrap_err(), "insufficient stock");
        assert_eq!(inventory[&1].stock, 2);
    }

    #[test]
    fn test_unknown_product_rejects_and_preserves_inventory() {
        let mut inventory = inventory_of(&[(1, 100, 10)]);
        let result = create_order(
            &mut inventory,
            &[line(1, 2, 120), line(99, 1, 50)],
            OrderStatus::Pending,
        );
        assert_eq!(result.unwrap_err(), "product not found");
        assert_eq!(inventory[&1].stock, 10);
    }

    #[test]
    fn test_duplicate_lines_merge_before_stock_check() {
        let mut inventory = inventory_of(&[(1, 100, 10)]);

        // 6 + 5 = 11 exceeds the 10 in stock even though each line alone fits
        let result = create_order(
            &mut inventory,
            &[line(1, 6, 120), line(1, 5, 120)],
            OrderStatus::Pending,
        );
        assert_eq!(result.unwrap_err(), "insufficient stock");
        assert_eq!(inventory[&1].stock, 10);

        // 6 + 4 = 10 fits exactly
        let order = create_order(
            &mut inventory,
            &[line(1, 6, 120), line(1, 4, 115)],
            OrderStatus::Pending,
        )
        .unwrap();
        assert_eq!(inventory[&1].stock, 0);
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].quantity, 10);
        // Last line's price wins for the merged line
        assert_eq!(order.lines[0].price_each, dec(115));
        assert_eq!(order.total_amount, dec(1150));
    }

    #[test]
    fn test_items_edit_rejected_for_non_pending_order() {
        let mut inventory = inventory_of(&[(1, 100, 10)]);
        let mut order =
            create_order(&mut inventory, &[line(1, 3, 120)], OrderStatus::Completed).unwrap();

        let before = inventory.clone();
        let result = edit_order_items(&mut inventory, &mut order, &[line(1, 1, 120)]);
        assert_eq!(
            result.unwrap_err(),
            "editing items is only allowed for pending orders"
        );
        assert_eq!(inventory, before);
        assert_eq!(order.lines, vec![line(1, 3, 120)]);
    }

    #[test]
    fn test_failed_replacement_rolls_back_restoration() {
        let mut inventory = inventory_of(&[(1, 100, 10), (2, 50, 1)]);
        let mut order =
            create_order(&mut inventory, &[line(1, 4, 120)], OrderStatus::Pending).unwrap();
        assert_eq!(inventory[&1].stock, 6);

        // New set needs more of product 2 than exists; the restoration of
        // product 1 must not survive the failure
        let before = inventory.clone();
        let result = edit_order_items(
            &mut inventory,
            &mut order,
            &[line(1, 2, 120), line(2, 3, 60)],
        );
        assert_eq!(result.unwrap_err(), "insufficient stock");
        assert_eq!(inventory, before);
        assert_eq!(order.total_amount, dec(480));
    }

    #[test]
    fn test_replacement_can_reuse_restored_stock() {
        // 8 of 10 units already held by the order; replacing with 10 works
        // because the order's own units come back first
        let mut inventory = inventory_of(&[(1, 100, 10)]);
        let mut order =
            create_order(&mut inventory, &[line(1, 8, 120)], OrderStatus::Pending).unwrap();
        assert_eq!(inventory[&1].stock, 2);

        edit_order_items(&mut inventory, &mut order, &[line(1, 10, 120)]).unwrap();
        assert_eq!(inventory[&1].stock, 0);
        assert_eq!(order.total_amount, dec(1200));
    }

    #[test]
    fn test_delete_restores_multiple_products() {
        let mut inventory = inventory_of(&[(1, 100, 10), (2, 50, 4)]);
        let order = create_order(
            &mut inventory,
            &[line(1, 3, 120), line(2, 4, 60)],
            OrderStatus::Pending,
        )
        .unwrap();
        assert_eq!(inventory[&1].stock, 7);
        assert_eq!(inventory[&2].stock, 0);

        delete_order(&mut inventory, order);
        assert_eq!(inventory[&1].stock, 10);
        assert_eq!(inventory[&2].stock, 4);
    }

    #[test]
    fn test_profit_can_be_negative_when_selling_below_cost() {
        let mut inventory = inventory_of(&[(1, 100, 10)]);
        let order =
            create_order(&mut inventory, &[line(1, 2, 80)], OrderStatus::Pending).unwrap();
        assert_eq!(order.total_amount, dec(160));
        assert_eq!(order.profit, dec(-40));
    }

    #[test]
    fn test_every_status_reachable_from_every_other() {
        let statuses = [
            OrderStatus::Pending,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ];
        // Only enum membership is enforced; no transition restrictions
        for from in statuses {
            for to in statuses {
                assert!(OrderStatus::parse(to.as_str()).is_some(), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_empty_item_set_rejected() {
        let mut inventory = inventory_of(&[(1, 100, 10)]);
        let result = create_order(&mut inventory, &[], OrderStatus::Pending);
        assert!(result.is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    const PRODUCT_COUNT: u32 = 4;

    /// Strategy for a product universe with ids 0..PRODUCT_COUNT
    fn inventory_strategy() -> impl Strategy<Value = Inventory> {
        prop::collection::vec((1i64..=500, 0i32..=50), PRODUCT_COUNT as usize).prop_map(|entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(id, (price, stock))| {
                    (
                        id as u32,
                        SimProduct {
                            price: Decimal::from(price),
                            stock,
                        },
                    )
                })
                .collect()
        })
    }

    /// Strategy for request lines over the product universe
    fn lines_strategy() -> impl Strategy<Value = Vec<SimLine>> {
        prop::collection::vec(
            (0u32..PRODUCT_COUNT, 1i32..=20, 1i64..=600),
            1..6,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .map(|(product, quantity, price)| SimLine {
                    product,
                    quantity,
                    price_each: Decimal::from(price),
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// No sequence of create/edit/delete drives stock negative
        #[test]
        fn prop_stock_never_negative(
            mut inventory in inventory_strategy(),
            first in lines_strategy(),
            second in lines_strategy()
        ) {
            if let Ok(mut order) = create_order(&mut inventory, &first, OrderStatus::Pending) {
                let _ = edit_order_items(&mut inventory, &mut order, &second);
                for product in inventory.values() {
                    prop_assert!(product.stock >= 0);
                }
                delete_order(&mut inventory, order);
            }
            for product in inventory.values() {
                prop_assert!(product.stock >= 0);
            }
        }

        /// Persisted totals equal the sums over the order's line set
        #[test]
        fn prop_totals_reconcile_with_lines(
            mut inventory in inventory_strategy(),
            lines in lines_strategy()
        ) {
            let costs: HashMap<u32, Decimal> =
                inventory.iter().map(|(&id, p)| (id, p.price)).collect();

            if let Ok(order) = create_order(&mut inventory, &lines, OrderStatus::Pending) {
                let expected_total: Decimal = order
                    .lines
                    .iter()
                    .map(|l| l.price_each * Decimal::from(l.quantity))
                    .sum();
                let expected_profit: Decimal = order
                    .lines
                    .iter()
                    .map(|l| (l.price_each - costs[&l.product]) * Decimal::from(l.quantity))
                    .sum();
                prop_assert_eq!(order.total_amount, expected_total);
                prop_assert_eq!(order.profit, expected_profit);
            }
        }

        /// Creating then deleting an order restores stock exactly
        #[test]
        fn prop_create_delete_round_trip(
            mut inventory in inventory_strategy(),
            lines in lines_strategy()
        ) {
            let before = inventory.clone();
            if let Ok(order) = create_order(&mut inventory, &lines, OrderStatus::Pending) {
                delete_order(&mut inventory, order);
            }
            prop_assert_eq!(inventory, before);
        }

        /// Replacing items nets out the same as delete-then-recreate
        #[test]
        fn prop_edit_matches_delete_then_create(
            base in inventory_strategy(),
            first in lines_strategy(),
            second in lines_strategy()
        ) {
            let mut inv_edit = base.clone();
            let Ok(mut order_a) = create_order(&mut inv_edit, &first, OrderStatus::Pending) else {
                return Ok(());
            };

            let mut inv_recreate = base;
            let order_b =
                create_order(&mut inv_recreate, &first, OrderStatus::Pending).unwrap();

            let edited = edit_order_items(&mut inv_edit, &mut order_a, &second).is_ok();

            delete_order(&mut inv_recreate, order_b);
            let recreated =
                create_order(&mut inv_recreate, &second, OrderStatus::Pending).is_ok();

            prop_assert_eq!(edited, recreated);
            if edited {
                prop_assert_eq!(inv_edit, inv_recreate);
            }
        }

        /// A failed create leaves the inventory untouched
        #[test]
        fn prop_failed_create_preserves_inventory(
            mut inventory in inventory_strategy(),
            lines in lines_strategy()
        ) {
            let before = inventory.clone();
            if create_order(&mut inventory, &lines, OrderStatus::Pending).is_err() {
                prop_assert_eq!(inventory, before);
            }
        }

        /// Merging preserves the total quantity requested per product
        #[test]
        fn prop_merge_preserves_quantity_per_product(lines in lines_strategy()) {
            let merged = merge_lines(&lines);

            for product in 0..PRODUCT_COUNT {
                let requested: i32 = lines
                    .iter()
                    .filter(|l| l.product == product)
                    .map(|l| l.quantity)
                    .sum();
                let after: i32 = merged
                    .iter()
                    .filter(|l| l.product == product)
                    .map(|l| l.quantity)
                    .sum();
                prop_assert_eq!(requested, after);
            }

            // Each product appears at most once after merging
            for (i, a) in merged.iter().enumerate() {
                for b in &merged[i + 1..] {
                    prop_assert_ne!(a.product, b.product);
                }
            }
        }
    }
}
