use std::collections::BTreeMap;

use crate::models::code_file::{CodeFile, TestStatus};

struct Challenge {
    id: &'static str,
    name: &'static str,
    language: &'static str,
    content: &'static str,
    expected_output: &'static str,
}

const CHALLENGES: [Challenge; 4] = [
    Challenge {
        id: "reactor",
        name: "reactor.py",
        language: "python",
        content: "def count_up(n):\n    total = 0\n    for i in range(1, n + 1):\n        total = total + i\n    return total\n\nprint(count_up(10))\n",
        expected_output: "55",
    },
    Challenge {
        id: "navigation",
        name: "navigation.js",
        language: "javascript",
        content: "const route = [3, 1, 2];\nroute.sort((a, b) => a - b);\nconsole.log(route.join(\",\"));\n",
        expected_output: "1,2,3",
    },
    Challenge {
        id: "oxygen",
        name: "Oxygen.java",
        language: "java",
        content: "public class Main {\n    public static void main(String[] args) {\n        int level = 0;\n        for (int i = 0; i < 5; i++) {\n            level += 20;\n        }\n        boolean safe = true;\n        System.out.println(safe ? level : 0);\n    }\n}\n",
        expected_output: "100",
    },
    Challenge {
        id: "shields",
        name: "shields.c",
        language: "c",
        content: "#include <stdio.h>\n\nint main() {\n    int shields = 3;\n    while (shields > 0) {\n        printf(\"%d\\n\", shields);\n        shields--;\n    }\n    return 0;\n}\n",
        expected_output: "3\n2\n1",
    },
];

/// Fresh copies of every challenge file, keyed by file id.
pub fn seed_files() -> BTreeMap<String, CodeFile> {
    CHALLENGES
        .iter()
        .map(|c| {
            (
                c.id.to_string(),
                CodeFile {
                    id: c.id.to_string(),
                    name: c.name.to_string(),
                    language: c.language.to_string(),
                    content: c.content.to_string(),
                    expected_output: c.expected_output.to_string(),
                    test_status: TestStatus::Pending,
                    is_corrupted: false,
                    last_sabotage: None,
                    last_output: None,
                },
            )
        })
        .collect()
}
