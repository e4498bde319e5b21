// Temporary diagnostic — delete after use.
use commgraph_db::init_memory;

#[tokio::main]
async fn main() {
    let db = init_memory().await.unwrap();

    db.query("INSERT INTO person (email, created_at) VALUES ('a@x.com', time::now())")
        .await
        .unwrap()
        .check()
        .unwrap();
    db.query("INSERT INTO person (email, created_at) VALUES ('b@x.com', time::now())")
        .await
        .unwrap()
        .check()
        .unwrap();

    let mut ids: surrealdb::Response = db
        .query("SELECT VALUE id FROM person WHERE email = 'a@x.com'")
        .await
        .unwrap();
    let from: Vec<surrealdb::RecordId> = ids.take(0).unwrap();
    let mut ids2: surrealdb::Response = db
        .query("SELECT VALUE id FROM person WHERE email = 'b@x.com'")
        .await
        .unwrap();
    let to: Vec<surrealdb::RecordId> = ids2.take(0).unwrap();
    println!("from={:?} to={:?}", from, to);

    db.query("RELATE $from->communicates_with->$to CONTENT { count: 5 }")
        .bind(("from", from[0].clone()))
        .bind(("to", to[0].clone()))
        .await
        .unwrap()
        .check()
        .unwrap();

    let mut r = db.query("SELECT VALUE id FROM communicates_with").await.unwrap();
    let all: Vec<surrealdb::RecordId> = r.take(0).unwrap();
    println!("all edge ids: {:?}", all);

    let mut r2 = db
        .query("SELECT VALUE id FROM communicates_with WHERE in.email = 'a@x.com' AND out.email = 'b@x.com'")
        .await
        .unwrap();
    let found: Vec<surrealdb::RecordId> = r2.take(0).unwrap();
    println!("edge lookup by in.email/out.email: {:?}", found);

    let mut r3 = db
        .query("SELECT in.email AS fe, out.email AS te FROM communicates_with")
        .await
        .unwrap();
    let proj: Vec<serde_json::Value> = r3.take(0).unwrap();
    println!("projection: {}", serde_json::to_string(&proj).unwrap());

    for q in [
        "SELECT VALUE id FROM communicates_with WHERE in.email = 'a@x.com'",
        "SELECT VALUE id FROM communicates_with WHERE out.email = 'b@x.com'",
        "SELECT VALUE id FROM communicates_with WHERE `in`.email = 'a@x.com' AND `out`.email = 'b@x.com'",
        "SELECT VALUE id FROM communicates_with WHERE (in.email = 'a@x.com') AND (out.email = 'b@x.com')",
        "SELECT VALUE id FROM communicates_with WHERE in.email == 'a@x.com'",
        "SELECT VALUE id FROM communicates_with WHERE string::lowercase(in.email) = 'a@x.com'",
        "SELECT VALUE id FROM communicates_with WHERE in = (SELECT VALUE id FROM ONLY person WHERE email = 'a@x.com' LIMIT 1)",
        "SELECT VALUE id FROM communicates_with WITH NOINDEX WHERE in.email = 'a@x.com' AND out.email = 'b@x.com'",
    ] {
        let mut r = db.query(q).await.unwrap();
        let got: Result<Vec<surrealdb::RecordId>, _> = r.take(0);
        println!("{q}\n  -> {:?}", got);
    }
}
