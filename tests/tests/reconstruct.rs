#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::time::Duration;
    use xch_history::{list_records, reconstruct, ReconstructOptions, TransactionGroup};
    use xch_history_core::blockchain::sized_bytes::Bytes32;
    use xch_history_core::errors::HistoryError;
    use xch_history_keys::Address;
    use xch_history_tests::{hash, Lookup, MemoryFullnode};

    const OWNER: u8 = 0xaa;
    const OTHER: u8 = 0x11;
    const PAYEE: u8 = 0x22;

    fn owner() -> Address {
        Address::new("xch", hash(OWNER))
    }

    fn other(h: u8) -> Address {
        Address::new("xch", hash(h))
    }

    async fn history(node: &MemoryFullnode) -> Result<Vec<TransactionGroup>, HistoryError> {
        reconstruct(node, &owner(), &ReconstructOptions::default()).await
    }

    /// A coin for the owner funded by an outside wallet, spent later into
    /// `outputs`.
    fn funded_spend(node: &mut MemoryFullnode, amount: u64, outputs: &[(Bytes32, u64)]) -> Bytes32 {
        let funding = node.add_coin(hash(1), hash(OTHER), amount * 2, 1);
        let coin = node.spend_into(&funding, 2, &[(hash(OWNER), amount)])[0];
        node.spend_into(&coin, 4, outputs);
        coin
    }

    #[tokio::test]
    async fn test_pure_receive() {
        let mut node = MemoryFullnode::new("xch");
        let parent = node.add_coin(hash(1), hash(OTHER), 5000, 1);
        node.spend_into(&parent, 2, &[(hash(OWNER), 1000)]);
        let groups = history(&node).await.unwrap();
        assert_eq!(groups.len(), 1);
        match &groups[0] {
            TransactionGroup::Receive(g) => {
                assert_eq!(g.transactions.len(), 1);
                assert_eq!(g.transactions[0].sender, other(OTHER));
                assert_eq!(g.transactions[0].amount, 1000);
                assert_eq!(g.amount, 1000);
                assert_eq!(g.fee, 0);
                assert_eq!(g.block, 2);
                assert_eq!(g.timestamp, MemoryFullnode::block_timestamp(2));
            }
            other => panic!("unexpected group {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_spend_with_change() {
        let mut node = MemoryFullnode::new("xch");
        let received = node.add_coin(hash(1), hash(OTHER), 5000, 1);
        let own = node.spend_into(&received, 2, &[(hash(OWNER), 1100)])[0];
        let change = node.spend_into(&own, 3, &[(hash(OWNER), 900), (hash(OTHER), 200)])[0];
        node.spend_into(&change, 5, &[(hash(OWNER), 200), (hash(PAYEE), 700)]);
        let groups = history(&node).await.unwrap();
        assert_eq!(groups.len(), 3);
        match &groups[0] {
            TransactionGroup::Send(g) => {
                assert_eq!(g.amount, 900);
                assert_eq!(g.block, 5);
                assert_eq!(g.timestamp, MemoryFullnode::block_timestamp(5));
                assert_eq!(g.transactions.len(), 1);
                assert_eq!(g.transactions[0].destination, other(PAYEE));
                assert_eq!(g.transactions[0].amount, 700);
                assert_eq!(g.fee, 0);
            }
            other => panic!("unexpected group {other:?}"),
        }
        match &groups[1] {
            TransactionGroup::Send(g) => {
                assert_eq!(g.amount, 1100);
                assert_eq!(g.transactions[0].destination, other(OTHER));
                assert_eq!(g.fee, 0);
            }
            other => panic!("unexpected group {other:?}"),
        }
        assert!(!groups[2].is_send());
        assert_eq!(groups[2].block(), 2);
    }

    #[tokio::test]
    async fn test_zero_amount_coins_are_ignored() {
        let mut node = MemoryFullnode::new("xch");
        let parent = node.add_coin(hash(1), hash(OTHER), 5000, 1);
        node.spend_into(&parent, 2, &[(hash(OWNER), 0), (hash(OWNER), 10)]);
        let groups = history(&node).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].amount(), 10);
        assert_eq!(node.calls(Lookup::CoinRecordByName), 1);
    }

    #[tokio::test]
    async fn test_send_fee_counts_every_child() {
        let mut node = MemoryFullnode::new("xch");
        let coin = funded_spend(
            &mut node,
            1000,
            &[(hash(PAYEE), 600), (hash(OWNER), 300), (hash(OTHER), 50)],
        );
        let groups = history(&node).await.unwrap();
        let sends: Vec<&TransactionGroup> = groups.iter().filter(|g| g.is_send()).collect();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].amount(), 1000);
        assert_eq!(sends[0].fee(), 1000 - 600 - 300 - 50);
        match sends[0] {
            TransactionGroup::Send(g) => {
                let destinations: Vec<&Address> =
                    g.transactions.iter().map(|t| &t.destination).collect();
                assert_eq!(destinations, vec![&other(PAYEE), &other(OTHER)]);
            }
            other => panic!("unexpected group {other:?}"),
        }
        assert!(node.coin(&coin).is_some_and(|r| r.spent));
    }

    #[tokio::test]
    async fn test_siblings_share_one_receive() {
        let mut node = MemoryFullnode::new("xch");
        let parent = node.add_coin(hash(1), hash(OTHER), 5000, 1);
        node.spend_into(
            &parent,
            2,
            &[(hash(OWNER), 100), (hash(PAYEE), 50), (hash(OWNER), 200), (hash(OWNER), 300)],
        );
        let groups = history(&node).await.unwrap();
        assert_eq!(groups.len(), 1);
        match &groups[0] {
            TransactionGroup::Receive(g) => {
                assert_eq!(g.transactions.len(), 3);
                assert_eq!(g.amount, 100);
                assert_eq!(g.fee, 100 - 100 - 200 - 300);
                let amounts: Vec<u64> = g.transactions.iter().map(|t| t.amount).collect();
                assert_eq!(amounts, vec![100, 200, 300]);
            }
            other => panic!("unexpected group {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_groups_are_newest_first_and_deterministic() {
        let mut node = MemoryFullnode::new("xch");
        for (i, height) in [4u32, 9, 2, 9, 6].into_iter().enumerate() {
            let parent = node.add_coin(hash(1 + i as u8), hash(OTHER + i as u8), 5000, 1);
            node.spend_into(&parent, height, &[(hash(OWNER), 10 + i as u64)]);
        }
        funded_spend(&mut node, 500, &[(hash(PAYEE), 499)]);
        let groups = history(&node).await.unwrap();
        assert_eq!(groups.len(), 7);
        for pair in groups.windows(2) {
            assert!(pair[0].timestamp() >= pair[1].timestamp());
        }
        let first = serde_json::to_vec(&groups).unwrap();
        for max_concurrent_lookups in [1, 3, 64] {
            let again = reconstruct(
                &node,
                &owner(),
                &ReconstructOptions {
                    max_concurrent_lookups,
                },
            )
            .await
            .unwrap();
            assert_eq!(serde_json::to_vec(&again).unwrap(), first);
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_fails_the_whole_history() {
        let mut node = MemoryFullnode::new("xch");
        let parent = node.add_coin(hash(1), hash(OTHER), 5000, 1);
        node.spend_into(&parent, 2, &[(hash(OWNER), 1000)]);
        funded_spend(&mut node, 300, &[(hash(PAYEE), 300)]);
        node.fail_on(Lookup::AdditionsAndRemovals);
        match history(&node).await {
            Err(HistoryError::Lookup(e)) => assert_eq!(e.kind(), ErrorKind::ConnectionRefused),
            other => panic!("expected lookup failure, got {other:?}"),
        }
    }

    /// Ten unspent coins from ten outside parents, so each record needs
    /// exactly one parent lookup.
    fn receive_only_node() -> MemoryFullnode {
        let mut node = MemoryFullnode::new("xch");
        for i in 0..10u8 {
            let parent = node.add_coin(hash(1 + i), hash(OTHER + i), 5000, 1);
            node.spend_into(&parent, 2 + u32::from(i), &[(hash(OWNER), 100)]);
        }
        node
    }

    #[tokio::test]
    async fn test_first_failure_stops_sequential_lookups() {
        let mut node = receive_only_node();
        node.fail_on(Lookup::CoinRecordByName);
        let result = reconstruct(
            &node,
            &owner(),
            &ReconstructOptions {
                max_concurrent_lookups: 1,
            },
        )
        .await;
        assert!(matches!(result, Err(HistoryError::Lookup(_))));
        assert_eq!(node.calls(Lookup::CoinRecordByName), 1);
    }

    #[tokio::test]
    async fn test_failure_drops_in_flight_lookups() {
        let mut node = receive_only_node();
        node.fail_on(Lookup::CoinRecordByName);
        node.with_delay(Duration::from_millis(10));
        let result = reconstruct(
            &node,
            &owner(),
            &ReconstructOptions {
                max_concurrent_lookups: 3,
            },
        )
        .await;
        assert!(matches!(result, Err(HistoryError::Lookup(_))));
        assert_eq!(node.calls(Lookup::CoinRecordByName), 3);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(node.calls(Lookup::CoinRecordByName), 3);
    }

    #[tokio::test]
    async fn test_send_fee_above_i64_max() {
        let amount = (1u64 << 63) + 10;
        let mut node = MemoryFullnode::new("xch");
        let funding = node.add_coin(hash(1), hash(OTHER), u64::MAX, 1);
        let coin = node.spend_into(&funding, 2, &[(hash(OWNER), amount)])[0];
        node.spend_into(&coin, 4, &[(hash(PAYEE), amount - 5)]);
        let groups = history(&node).await.unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups[0].is_send());
        assert_eq!(groups[0].amount(), amount);
        assert_eq!(groups[0].fee(), 5);
        assert_eq!(groups[1].amount(), amount);
        assert_eq!(groups[1].fee(), 0);
    }

    #[tokio::test]
    async fn test_unknown_parent_is_a_failure() {
        let mut node = MemoryFullnode::new("xch");
        let parent = node.add_coin(hash(1), hash(OTHER), 5000, 1);
        node.spend_into(&parent, 2, &[(hash(OWNER), 1000)]);
        node.remove_coin(&parent);
        match history(&node).await {
            Err(HistoryError::Lookup(e)) => assert_eq!(e.kind(), ErrorKind::NotFound),
            other => panic!("expected lookup failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_block_without_timestamp_is_a_failure() {
        let mut node = MemoryFullnode::new("xch");
        funded_spend(&mut node, 300, &[(hash(PAYEE), 300)]);
        node.add_block(4, None);
        match history(&node).await {
            Err(HistoryError::Lookup(e)) => assert_eq!(e.kind(), ErrorKind::InvalidData),
            other => panic!("expected lookup failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_address() {
        let node = MemoryFullnode::new("xch");
        assert!(history(&node).await.unwrap().is_empty());
        assert_eq!(node.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_list_records_uses_node_default() {
        let mut node = MemoryFullnode::new("xch");
        funded_spend(&mut node, 300, &[(hash(OWNER), 250)]);
        let records = list_records(&node, &owner()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].coin.amount, 250);
        assert!(!records[0].spent);
    }
}
