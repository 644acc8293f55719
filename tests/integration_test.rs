// Integration tests for Draftsman

use draftsman::{build, DiagramBuilder, DiagramDocument, DiagramKind, Language, LanguageTag, Registry};

const INVOICE: &str =
    "class Invoice extends Document { private String id; public String getId() { return id; } }";

fn convert(language: &str, kind: &str, source: &str) -> DiagramDocument {
    Registry::standard()
        .get(language, kind)
        .expect("valid combination")
        .document(source)
}

fn position(doc: &DiagramDocument, line: &str) -> usize {
    doc.lines()
        .iter()
        .position(|l| l.trim() == line)
        .unwrap_or_else(|| panic!("missing line {:?} in\n{}", line, doc))
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_class_diagram_for_single_type() {
    let doc = convert("java", "class", INVOICE);

    assert_eq!(doc.kind(), DiagramKind::Class);
    assert_eq!(doc.lines().iter().filter(|l| l.starts_with("class Invoice")).count(), 1);
    assert!(doc.contains_line("- id : String"));
    assert!(doc.contains_line("+ getId() : String"));
    assert!(doc.contains_line("Document <|-- Invoice"));
}

#[test]
fn test_use_case_for_post_endpoint() {
    let code = r#"
@RestController
public class OrderController {
    @PostMapping("/orders")
    public Order createOrder(@RequestBody Order order) { return service.save(order); }
}"#;
    let doc = convert("java", "use_case", code);

    assert!(doc.contains_line("actor User"));
    assert!(doc.contains_line("usecase (Create Order)"));
    assert!(doc.contains_line("User --> (Create Order)"));
}

#[test]
fn test_listing_without_dependencies() {
    let listing = "src/services/OrderService.java\nsrc/models/Order.java\n";

    let packages = convert("any", "package", listing);
    assert!(packages.contains_line("package \"src.services\" as src_services {"));
    assert!(packages.contains_line("package \"src.models\" as src_models {"));
    assert!(!packages.lines().iter().any(|l| l.contains("-->") || l.contains("..>")));

    let components = convert("java", "component", listing);
    assert!(components.contains_line("package \"src.services\" {"));
    assert!(components.contains_line("package \"src.models\" {"));
    assert!(components.text().contains("\"OrderService\""));
    assert!(components.text().contains("\"Order\""));
}

#[test]
fn test_batch_with_unknown_kind() {
    let code = "class Account:\n    def deposit(self, amount: int) -> None:\n        self.balance += amount\n";
    let results = build(code, "python", ["class", "bogus_kind"]);

    assert_eq!(results.len(), 2);
    let class = results["class"].as_ref().expect("class diagram");
    assert!(class.text().contains("class Account"));
    let error = results["bogus_kind"].as_ref().expect_err("unknown kind");
    assert!(error.contains("bogus_kind"));
    assert!(error.contains("python+class"));
}

#[test]
fn test_activity_if_else() {
    let doc = convert("java", "activity", "class A { public void run() { if (x) { a(); } else { b(); } } }");

    let open = position(&doc, "if (x?) then (yes)");
    let yes = position(&doc, ":Call a();");
    let otherwise = position(&doc, "else (no)");
    let no = position(&doc, ":Call b();");
    let close = position(&doc, "endif");
    let stop = position(&doc, "stop");
    assert!(open < yes && yes < otherwise && otherwise < no && no < close && close < stop);
}

#[test]
fn test_activity_condition_keeps_calls() {
    let doc = convert(
        "java",
        "activity",
        "class A { public void run(Order order) { if (isValid(order)) { a(); } } }",
    );
    assert!(doc.contains_line("if (isValid(order)?) then (yes)"), "{}", doc);

    let doc = convert(
        "java",
        "activity",
        "class B { public void save(Customer c) { if (!validator.validate(c)) { reject(); } else { store(c); } } }",
    );
    assert!(doc.contains_line("if (!validator.validate(c)?) then (yes)"), "{}", doc);
}

// ============================================================================
// Properties
// ============================================================================

const SAMPLES: &[(&str, &str)] = &[
    ("java", INVOICE),
    (
        "csharp",
        "namespace Shop { public class CartController : ControllerBase { private readonly ICartService _svc; \
         [HttpPost(\"cart\")] public IActionResult Add(int id) { _svc.AddItem(id); return Ok(); } } }",
    ),
    (
        "php",
        "<?php class UserController { public function store($request) { $this->mailer->sendWelcome($request); } }",
    ),
    (
        "javascript",
        "class OrderController {\n  async create(req, res) {\n    await this.orderService.create(req.body);\n  }\n}",
    ),
    (
        "python",
        "class OrderService:\n    def place(self, order):\n        if order.valid:\n            self.repo.save(order)\n",
    ),
];

#[test]
fn test_conversion_is_deterministic() {
    for (language, source) in SAMPLES {
        for kind in DiagramKind::ALL {
            let first = convert(language, kind.as_str(), source);
            let second = convert(language, kind.as_str(), source);
            assert_eq!(first, second, "{} {}", language, kind);
        }
    }
}

#[test]
fn test_batch_matches_single_conversions() {
    let kinds: Vec<&str> = DiagramKind::ALL.iter().map(|k| k.as_str()).collect();
    for (language, source) in SAMPLES {
        let results = DiagramBuilder::new().build_batch(source, language, &kinds);
        for kind in &kinds {
            let batch = results[*kind].as_ref().expect("supported kind");
            assert_eq!(*batch, convert(language, kind, source));
        }
    }
}

#[test]
fn test_no_state_between_calls() {
    let other = "class Shipment { private Carrier carrier; }";
    let before = convert("java", "class", INVOICE);
    let unrelated = convert("java", "class", other);
    let after = convert("java", "class", INVOICE);

    assert_eq!(before, after);
    assert!(!unrelated.text().contains("Invoice"));
    assert!(!after.text().contains("Shipment"));
}

#[test]
fn test_relationships_deduplicated() {
    let code = "class Customer { } class Order { private Customer buyer; private Customer payer; \
                public void bill(Customer c) { } public void ship(Customer c) { } }";
    let doc = convert("java", "class", code);

    let count = |prefix: &str| doc.lines().iter().filter(|l| l.starts_with(prefix)).count();
    assert_eq!(count("Order *-- Customer"), 1);
    assert_eq!(count("Order ..> Customer"), 1);
}

#[test]
fn test_concurrent_conversions_stay_separate() {
    let sources = [
        "class Invoice { private Ledger ledger; } class Ledger { }",
        "class Shipment { private Carrier carrier; } class Carrier { }",
    ];
    let docs: Vec<DiagramDocument> = std::thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .map(|source| scope.spawn(move || convert("java", "class", source)))
            .collect();
        handles.into_iter().map(|h| h.join().expect("conversion thread")).collect()
    });

    let first = docs[0].text();
    assert!(first.contains("class Invoice") && first.contains("class Ledger"));
    assert!(!first.contains("Shipment") && !first.contains("Carrier"));
    let second = docs[1].text();
    assert!(second.contains("class Shipment") && second.contains("class Carrier"));
    assert!(!second.contains("Invoice") && !second.contains("Ledger"));
}

#[test]
fn test_script_private_field_in_class_diagram() {
    let doc = convert("javascript", "class", "class Cart {\n  #items = [];\n  total() { return this.#items.length; }\n}\n");
    let lines = doc.lines();
    assert!(lines.iter().any(|l| l.trim().starts_with("- items")), "{}", doc);
    assert!(lines.iter().any(|l| l.trim().starts_with("+ total(")), "{}", doc);
}

#[test]
fn test_malformed_input_degrades() {
    let inputs = ["", "}}}} class", "class A { public void run( {", "\"unterminated /* comment", "@@@ ### ;;;"];
    for combination in Registry::combinations() {
        let (language, kind) = combination;
        let converter = Registry::standard().lookup(language, kind).expect("listed combination");
        for input in inputs {
            let doc = converter.document(input);
            assert_eq!(doc.lines().first().map(String::as_str), Some("@startuml"));
            assert_eq!(doc.lines().last().map(String::as_str), Some("@enduml"));
        }
    }
}

// ============================================================================
// Per-language smoke tests
// ============================================================================

#[test]
fn test_class_diagrams_per_language() {
    let cases = [
        ("csharp", "public class Product : IEntity { public string Name { get; set; } }", "IEntity <|.. Product"),
        ("php", "<?php class Admin extends User { private $level; }", "User <|-- Admin"),
        ("typescript", "export class Dog extends Animal { bark(): void { } }", "Animal <|-- Dog"),
        ("python", "class Square(Shape):\n    def area(self) -> float:\n        return 1.0\n", "Shape <|-- Square"),
    ];
    for (language, code, edge) in cases {
        let doc = convert(language, "class", code);
        assert!(doc.contains_line(edge), "{}:\n{}", language, doc);
    }
}

#[test]
fn test_sequence_diagram_orders_participants() {
    let code = r#"
public class OrderService {
    private OrderRepository repository;

    public Order placeOrder(Order order) {
        repository.save(order);
        return order;
    }
}"#;
    let doc = convert("java", "sequence", code);

    let actor = position(&doc, "actor User");
    let service = position(&doc, "control OrderService");
    let repository = position(&doc, "database OrderRepository");
    assert!(actor < service && service < repository);
    assert!(doc.text().contains("OrderService -> OrderRepository : save(order)"));
}

#[test]
fn test_manifest_package_diagram() {
    let manifest = r#"{ "name": "web", "dependencies": { "express": "^4.0.0", "lodash": "^4.17.0" } }"#;
    let doc = convert("any", "package", manifest);

    assert!(doc.text().contains("<<external>>"));
    assert!(doc.text().contains("external.express"));
}

#[test]
fn test_model_serializes_with_kind_tag() {
    let converter = Registry::standard()
        .lookup(LanguageTag::Concrete(Language::Java), DiagramKind::Class)
        .expect("java class");
    let value = serde_json::to_value(converter.extract(INVOICE)).unwrap();

    assert_eq!(value["kind"], "class");
    assert_eq!(value["types"][0]["name"], "Invoice");
}
