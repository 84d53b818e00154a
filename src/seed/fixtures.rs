//! Placeholder data for the dashboard demo database.

use time::macros::date;
use uuid::Uuid;

use crate::seed::types::{Customer, Invoice, Revenue, User};

const DEMO_USER: Uuid = Uuid::from_u128(0x410544b2_4001_4271_9855_fec4b6a6442a);

const EVIL_RABBIT: Uuid = Uuid::from_u128(0xd6e15727_9fe1_4961_8c5b_ea44a9bd81aa);
const DELBA_DE_OLIVEIRA: Uuid = Uuid::from_u128(0x3958dc9e_712f_4377_85e9_fec4b6a6442a);
const LEE_ROBINSON: Uuid = Uuid::from_u128(0x3958dc9e_742f_4377_85e9_fec4b6a6442a);
const MICHAEL_NOVOTNY: Uuid = Uuid::from_u128(0x76d65c26_f784_44a2_ac19_586678f7c2f2);
const AMY_BURNS: Uuid = Uuid::from_u128(0xcc27c14a_0acf_4f4a_a6c9_d45682c144b9);
const BALAZS_ORBAN: Uuid = Uuid::from_u128(0x13d07535_c59e_4157_a011_f8d2ef4e0cbb);

/// The four datasets written by one seed run.
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub users: Vec<User>,
    pub customers: Vec<Customer>,
    pub invoices: Vec<Invoice>,
    pub revenue: Vec<Revenue>,
}

impl Fixtures {
    pub fn placeholder() -> Self {
        Self {
            users: users(),
            customers: customers(),
            invoices: invoices(),
            revenue: revenue(),
        }
    }
}

fn users() -> Vec<User> {
    vec![User {
        id: DEMO_USER,
        name: "User".into(),
        email: "user@nextmail.com".into(),
        password: "123456".into(),
    }]
}

fn customers() -> Vec<Customer> {
    [
        (EVIL_RABBIT, "Evil Rabbit", "evil@rabbit.com", "evil-rabbit"),
        (DELBA_DE_OLIVEIRA, "Delba de Oliveira", "delba@oliveira.com", "delba-de-oliveira"),
        (LEE_ROBINSON, "Lee Robinson", "lee@robinson.com", "lee-robinson"),
        (MICHAEL_NOVOTNY, "Michael Novotny", "michael@novotny.com", "michael-novotny"),
        (AMY_BURNS, "Amy Burns", "amy@burns.com", "amy-burns"),
        (BALAZS_ORBAN, "Balazs Orban", "balazs@orban.com", "balazs-orban"),
    ]
    .into_iter()
    .map(|(id, name, email, slug)| Customer {
        id,
        name: name.into(),
        email: email.into(),
        image_url: format!("/customers/{slug}.png"),
    })
    .collect()
}

fn invoices() -> Vec<Invoice> {
    [
        (EVIL_RABBIT, 15795, "pending", date!(2022 - 12 - 06)),
        (DELBA_DE_OLIVEIRA, 20348, "pending", date!(2022 - 11 - 14)),
        (AMY_BURNS, 3040, "paid", date!(2022 - 10 - 29)),
        (MICHAEL_NOVOTNY, 44800, "paid", date!(2023 - 09 - 10)),
        (BALAZS_ORBAN, 34577, "pending", date!(2023 - 08 - 05)),
        (LEE_ROBINSON, 54246, "pending", date!(2023 - 07 - 16)),
        (EVIL_RABBIT, 666, "pending", date!(2023 - 06 - 27)),
        (MICHAEL_NOVOTNY, 32545, "paid", date!(2023 - 06 - 09)),
        (AMY_BURNS, 1250, "paid", date!(2023 - 06 - 17)),
        (BALAZS_ORBAN, 8546, "paid", date!(2023 - 06 - 07)),
        (DELBA_DE_OLIVEIRA, 500, "paid", date!(2023 - 08 - 19)),
        (BALAZS_ORBAN, 8945, "paid", date!(2023 - 06 - 03)),
        (LEE_ROBINSON, 1000, "paid", date!(2022 - 06 - 05)),
    ]
    .into_iter()
    .map(|(customer_id, amount, status, date)| Invoice {
        customer_id,
        amount,
        status: status.into(),
        date,
    })
    .collect()
}

fn revenue() -> Vec<Revenue> {
    [
        ("Jan", 2000),
        ("Feb", 1800),
        ("Mar", 2200),
        ("Apr", 2500),
        ("May", 2300),
        ("Jun", 3200),
        ("Jul", 3500),
        ("Aug", 3700),
        ("Sep", 2500),
        ("Oct", 2800),
        ("Nov", 3000),
        ("Dec", 4800),
    ]
    .into_iter()
    .map(|(month, revenue)| Revenue {
        month: month.into(),
        revenue,
    })
    .collect()
}
