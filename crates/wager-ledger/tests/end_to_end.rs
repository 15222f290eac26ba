//! Ledger-plane integration: resolutions, conservation and settlement across
//! several bets in one group.

use chrono::Utc;
use wager_ledger::{ConservationCheck, Ledger, SettlementDirection, resolution_postings, settlement_posting};
use wager_types::*;

struct Book {
    ledger: Ledger,
    group: GroupId,
    policy: SettlementPolicy,
}

impl Book {
    fn new(policy: SettlementPolicy) -> Self {
        Self {
            ledger: Ledger::new(),
            group: GroupId::new(),
            policy,
        }
    }

    /// Resolve a fresh bet between `originator` and `counterparty`.
    fn resolve(
        &mut self,
        originator: UserId,
        counterparty: UserId,
        stakes: (u64, u64),
        resolution: Resolution,
    ) -> BetId {
        let bet = Bet::dummy(self.group, originator, stakes.0, stakes.1);
        let matched = Match {
            id: MatchId::new(),
            bet_id: bet.id,
            bid_id: BidId::new(),
            originator_id: originator,
            originator_amount: stakes.0,
            counterparty_id: counterparty,
            counterparty_amount: stakes.1,
            created_at: Utc::now(),
        };
        let postings = resolution_postings(&bet, &matched, resolution, self.policy)
            .expect("postings for a well-formed match");
        self.ledger
            .post_resolution(bet.id, postings, Utc::now())
            .expect("first resolution");
        ConservationCheck::new(self.policy)
            .verify_resolution(&self.ledger.for_bet(bet.id), &matched, resolution)
            .expect("conservation holds");
        bet.id
    }

    fn settle(&mut self, user: UserId) -> SettlementDirection {
        let (posting, direction) =
            settlement_posting(self.group, user, self.ledger.balance(self.group, user))
                .expect("nonzero balance");
        self.ledger.append(posting, Utc::now()).expect("append settlement");
        direction
    }
}

#[test]
fn running_balances_across_bets() {
    let mut book = Book::new(SettlementPolicy::FullPot);
    let (alice, bob, carol) = (UserId::new(), UserId::new(), UserId::new());

    book.resolve(alice, bob, (100, 60), Resolution::Agreed { originator_won: true });
    book.resolve(bob, carol, (20, 30), Resolution::Agreed { originator_won: false });
    book.resolve(carol, alice, (10, 10), Resolution::Disputed);

    assert_eq!(book.ledger.balance(book.group, alice), 160);
    assert_eq!(book.ledger.balance(book.group, bob), -60 - 20);
    assert_eq!(book.ledger.balance(book.group, carol), 50);
    book.ledger.verify_chain().unwrap();

    assert_eq!(book.settle(alice), SettlementDirection::Received);
    assert_eq!(book.settle(bob), SettlementDirection::Paid);
    assert_eq!(book.settle(carol), SettlementDirection::Received);
    for user in [alice, bob, carol] {
        assert_eq!(book.ledger.balance(book.group, user), 0);
    }
    book.ledger.verify_chain().unwrap();
}

#[test]
fn zero_sum_book_always_nets_to_zero() {
    let mut book = Book::new(SettlementPolicy::ZeroSum);
    let users: Vec<UserId> = (0..4).map(|_| UserId::new()).collect();

    for (i, pair) in users.windows(2).enumerate() {
        let stake = 10 * (u64::try_from(i).unwrap() + 1);
        book.resolve(
            pair[0],
            pair[1],
            (stake, stake + 5),
            Resolution::Agreed {
                originator_won: i % 2 == 0,
            },
        );
    }

    let total: i64 = users
        .iter()
        .map(|u| book.ledger.balance(book.group, *u))
        .sum();
    assert_eq!(total, 0);
}

#[test]
fn repeat_resolution_leaves_ledger_untouched() {
    let mut book = Book::new(SettlementPolicy::FullPot);
    let (alice, bob) = (UserId::new(), UserId::new());
    let bet = book.resolve(alice, bob, (50, 50), Resolution::Agreed { originator_won: true });
    let head = book.ledger.head();
    let len = book.ledger.len();

    let again = vec![
        Posting::balance(alice, 100, TransactionType::Win, "Bet win").for_bet(bet, book.group),
    ];
    let err = book.ledger.post_resolution(bet, again, Utc::now()).unwrap_err();
    assert!(matches!(err, WagerError::AlreadyResolved(id) if id == bet));
    assert_eq!(book.ledger.head(), head);
    assert_eq!(book.ledger.len(), len);
}
