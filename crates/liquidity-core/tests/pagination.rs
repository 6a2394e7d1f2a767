//! Paging through pools and batch messages

mod common;

use common::*;
use liquidity_core::*;
use liquidity_types::*;
use rust_decimal_macros::dec;

#[test]
fn test_pools_one_per_page() {
    let mut keeper = keeper_with(Params::default());
    create_pool(&mut keeper, "1000000denomA,1000000denomB");
    create_pool(&mut keeper, "1000000denomA,1000000denomC");
    create_pool(&mut keeper, "1000000denomB,1000000denomC");

    let querier = keeper.querier();
    let mut seen = Vec::new();
    let mut page = PageRequest { limit: 1, count_total: true, ..PageRequest::default() };
    loop {
        let response = querier.liquidity_pools(&page).unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.pagination.total, Some(3));
        seen.push(response.items[0].id);
        match response.pagination.next_key {
            Some(key) => page = PageRequest { key: Some(key), limit: 1, count_total: true, ..PageRequest::default() },
            None => break,
        }
    }
    assert_eq!(seen, vec![1, 2, 3]);
}

#[test]
fn test_offset_and_default_limit() {
    let mut keeper = keeper_with(Params::default());
    create_pool(&mut keeper, "1000000denomA,1000000denomB");
    create_pool(&mut keeper, "1000000denomA,1000000denomC");

    let querier = keeper.querier();
    let all = querier.liquidity_pools(&PageRequest::default()).unwrap();
    assert_eq!(all.items.len(), 2);
    assert_eq!(all.pagination.next_key, None);
    assert_eq!(all.pagination.total, None);

    let second = querier
        .liquidity_pools(&PageRequest { offset: 1, ..PageRequest::default() })
        .unwrap();
    assert_eq!(second.items.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2]);

    let err = querier.liquidity_pools(&PageRequest::with_limit(MAX_PAGE_LIMIT + 1)).unwrap_err();
    assert!(matches!(err, LiquidityError::InvalidParameter { .. }));
}

#[test]
fn test_swap_messages_by_key() {
    let (mut keeper, _) = keeper_with_pool();
    keeper.begin_block(2).unwrap();
    for trader in ["alice", "bob", "alice"] {
        keeper
            .swap_within_batch(swap_msg(trader, 1, Coin::new("denomA", 1_000), "denomB", dec!(0.9), dec!(0.003)))
            .unwrap();
    }

    let querier = keeper.querier();
    let first = querier.pool_batch_swap_msgs(1, &PageRequest::with_limit(2)).unwrap();
    assert_eq!(first.items.iter().map(|s| s.msg_index).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(first.pagination.next_key, Some(2));

    let rest = querier.pool_batch_swap_msgs(1, &PageRequest::after(2, 2)).unwrap();
    assert_eq!(rest.items.iter().map(|s| s.msg_index).collect::<Vec<_>>(), vec![3]);
    assert_eq!(rest.pagination.next_key, None);

    assert!(matches!(
        querier.pool_batch_swap_msgs(7, &PageRequest::default()),
        Err(LiquidityError::PoolNotFound { pool_id: 7 })
    ));
    assert!(matches!(
        querier.pool_batch_swap_msg(1, 9),
        Err(LiquidityError::MsgNotFound { .. })
    ));
}
